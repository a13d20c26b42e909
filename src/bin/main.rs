// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use wallet_ledger::{BalanceKind, Direction, Ledger, UserId};

/// Wallet Ledger - Replay ledger operation CSV files
///
/// Reads ledger operations from a CSV file, applies them through the
/// ledger engine, and outputs final wallet states to stdout.
/// Supports credits, debits, transfers, and bonus credits.
#[derive(Parser, Debug)]
#[command(name = "wallet-ledger")]
#[command(about = "A wallet ledger engine that replays operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with ledger operations
    ///
    /// Expected format: type,user,to,amount,balance,description
    /// Example: cargo run -- operations.csv > wallets.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Replay operations from CSV
    let ledger = match replay_operations(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error replaying operations: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    if let Err(e) = write_wallets(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, user, to, amount, balance, description`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    op: String,
    user: u64,
    #[serde(deserialize_with = "csv::invalid_option")]
    to: Option<u64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    balance: Option<String>,
    description: Option<String>,
}

/// A parsed ledger operation ready to apply.
#[derive(Debug)]
enum Operation {
    Adjust {
        user: UserId,
        amount: Decimal,
        direction: Direction,
        balance: BalanceKind,
        reason: String,
    },
    Transfer {
        from: UserId,
        to: UserId,
        amount: Decimal,
        description: String,
    },
    Bonus {
        user: UserId,
        amount: Decimal,
        description: String,
    },
}

impl CsvRecord {
    /// Converts the CSV record into a ledger operation.
    ///
    /// Returns `None` for unknown operation types or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        let user = UserId(self.user);
        let balance = match self.balance.as_deref() {
            Some("bonus") => BalanceKind::Bonus,
            Some("real") | None => BalanceKind::Real,
            Some(_) => return None,
        };
        let description = self.description.unwrap_or_default();

        match self.op.to_lowercase().as_str() {
            "credit" => Some(Operation::Adjust {
                user,
                amount: self.amount?,
                direction: Direction::Add,
                balance,
                reason: description,
            }),
            "debit" => Some(Operation::Adjust {
                user,
                amount: self.amount?,
                direction: Direction::Subtract,
                balance,
                reason: description,
            }),
            "transfer" => Some(Operation::Transfer {
                from: user,
                to: UserId(self.to?),
                amount: self.amount?,
                description,
            }),
            "bonus" => Some(Operation::Bonus {
                user,
                amount: self.amount?,
                description,
            }),
            _ => None,
        }
    }
}

/// Replay ledger operations from a CSV reader.
///
/// Streaming parse, so arbitrarily large files never load fully into
/// memory. Wallets are provisioned on first sight of a user id (the replay
/// tool stands in for whatever flow provisioned them originally).
/// Malformed rows and rejected operations are skipped.
///
/// # CSV Format
///
/// Expected columns: `type, user, to, amount, balance, description`
/// - `type`: Operation type (credit, debit, transfer, bonus)
/// - `user`: Owning user id (u64); the sender for transfers
/// - `to`: Receiving user id (transfers only)
/// - `amount`: Decimal amount (always required)
/// - `balance`: Balance field (real or bonus; credit/debit only, default real)
/// - `description`: Audit note
///
/// # Example
///
/// ```csv
/// type,user,to,amount,balance,description
/// credit,1,,100.0,real,deposit approved
/// debit,1,,25.0,real,withdrawal approved
/// transfer,1,2,10.0,,gift
/// bonus,2,,5.0,,signup promo
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
/// Individual operation errors are logged but don't stop the replay.
pub fn replay_operations<R: Read>(reader: R) -> Result<Ledger, csv::Error> {
    let ledger = Ledger::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " credit "
        .flexible(true) // Allow missing trailing fields
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_operation() else {
                    tracing::warn!("skipping invalid operation record");
                    continue;
                };

                // Apply the operation; rejections are logged by the facade
                let _ = match op {
                    Operation::Adjust {
                        user,
                        amount,
                        direction,
                        balance,
                        reason,
                    } => {
                        ledger.ensure_wallet(user);
                        ledger
                            .adjust_balance(user, amount, direction, balance, reason)
                            .map(|_| ())
                    }
                    Operation::Transfer {
                        from,
                        to,
                        amount,
                        description,
                    } => {
                        ledger.ensure_wallet(from);
                        ledger.ensure_wallet(to);
                        ledger.transfer(from, to, amount, description).map(|_| ())
                    }
                    Operation::Bonus {
                        user,
                        amount,
                        description,
                    } => {
                        ledger.ensure_wallet(user);
                        ledger.credit_bonus(user, amount, description).map(|_| ())
                    }
                };
            }
            Err(e) => {
                // Skip malformed rows
                tracing::warn!("skipping malformed row: {e}");
                continue;
            }
        }
    }

    Ok(ledger)
}

/// Write wallet states to a CSV writer
///
/// Outputs all wallets in CSV format with 2 decimal precision.
///
/// # CSV Format
///
/// Columns: `user, real, bonus, pending, total_available, currency`
///
/// # Example
///
/// ```csv
/// user,real,bonus,pending,total_available,currency
/// 1,65.00,0.00,0.00,65.00,USD
/// 2,10.00,5.00,0.00,15.00,USD
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_wallets<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    // Serialize each wallet snapshot
    for wallet in ledger.engine().wallets() {
        wtr.serialize(wallet.value().as_ref())?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    #[test]
    fn parse_simple_credit() {
        let csv = "type,user,to,amount,balance,description\ncredit,1,,100.0,real,seed\n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.engine().wallet_count(), 1);
        let view = ledger.balance(UserId(1)).unwrap();
        assert_eq!(view.real, dec!(100.0));
    }

    #[test]
    fn parse_credit_and_debit() {
        let csv = "type,user,to,amount,balance,description\n\
                   credit,1,,100.0,real,seed\n\
                   debit,1,,30.0,real,withdrawal\n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        let view = ledger.balance(UserId(1)).unwrap();
        assert_eq!(view.real, dec!(70.0));
    }

    #[test]
    fn parse_transfer() {
        let csv = "type,user,to,amount,balance,description\n\
                   credit,1,,50.0,,seed\n\
                   transfer,1,2,50.0,,gift\n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.balance(UserId(1)).unwrap().real, dec!(0.0));
        assert_eq!(ledger.balance(UserId(2)).unwrap().real, dec!(50.0));
    }

    #[test]
    fn parse_bonus() {
        let csv = "type,user,to,amount,balance,description\nbonus,1,,5.0,,promo\n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        let view = ledger.balance(UserId(1)).unwrap();
        assert_eq!(view.bonus, dec!(5.0));
        assert_eq!(view.real, dec!(0.0));
    }

    #[test]
    fn parse_with_whitespace() {
        let csv = "type,user,to,amount,balance,description\n credit , 1 , , 100.0 , real , seed \n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.balance(UserId(1)).unwrap().real, dec!(100.0));
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "type,user,to,amount,balance,description\n\
                   credit,1,,100.0,,seed\n\
                   invalid,row,data,here,,\n\
                   credit,2,,50.0,,seed\n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.engine().wallet_count(), 2); // Two valid credits
    }

    #[test]
    fn rejected_operation_does_not_stop_replay() {
        let csv = "type,user,to,amount,balance,description\n\
                   credit,1,,50.0,,seed\n\
                   debit,1,,500.0,,too much\n\
                   credit,1,,10.0,,more\n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.balance(UserId(1)).unwrap().real, dec!(60.0));
    }

    #[test]
    fn write_wallets_to_csv() {
        let csv = "type,user,to,amount,balance,description\n\
                   credit,1,,100.5,,seed\n\
                   credit,2,,200.25,,seed\n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        let mut output = Vec::new();
        write_wallets(&ledger, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("user,real,bonus,pending,total_available,currency"));
    }

    #[test]
    fn unknown_balance_field_is_skipped() {
        let csv = "type,user,to,amount,balance,description\ncredit,1,,10.0,frozen,seed\n";
        let ledger = replay_operations(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.engine().wallet_count(), 0);
    }
}
