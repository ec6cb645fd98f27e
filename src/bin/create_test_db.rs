use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use ledgergrid::{
    CategoryKind, TransactionDraft, create_account, create_budget, create_category, create_user,
    initialize_db, upsert_transaction, week_of,
};

/// A utility for creating a database with sample data for ledgergrid.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many weeks of budgets and transactions to create, ending with the current week.
    #[arg(long, default_value_t = 8)]
    weeks: u8,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating users and accounts...");
    let alex = create_user("Alex", &conn)?;
    let sam = create_user("Sam", &conn)?;
    let everyday = create_account("Everyday", alex.id, &conn)?;
    let credit_card = create_account("Credit Card", alex.id, &conn)?;
    let joint = create_account("Joint", sam.id, &conn)?;

    println!("Creating categories...");
    let food = create_category("Food", None, CategoryKind::Expense, &conn)?;
    let groceries = create_category("Groceries", Some(food.id), CategoryKind::Expense, &conn)?;
    let eating_out = create_category("Eating Out", Some(food.id), CategoryKind::Expense, &conn)?;
    let home = create_category("Home", None, CategoryKind::Expense, &conn)?;
    let rent = create_category("Rent", Some(home.id), CategoryKind::Expense, &conn)?;
    let power = create_category("Power", Some(home.id), CategoryKind::Expense, &conn)?;
    let income = create_category("Income", None, CategoryKind::Income, &conn)?;
    let wages = create_category("Wages", Some(income.id), CategoryKind::Income, &conn)?;
    let interest = create_category("Interest", Some(income.id), CategoryKind::Income, &conn)?;

    println!("Creating budgets and transactions...");
    let today = OffsetDateTime::now_utc().date();
    let this_week = week_of(today);

    for weeks_ago in 0..i64::from(args.weeks) {
        let monday = this_week - Duration::weeks(weeks_ago);
        let variation = (weeks_ago % 3) as f64 * 7.5;

        let alex_groceries = create_budget("Groceries", alex.id, monday, 150.0, &conn)?;
        let alex_fun = create_budget("Fun", alex.id, monday, 60.0, &conn)?;
        let sam_household = create_budget("Household", sam.id, monday, 400.0, &conn)?;

        let drafts = [
            (monday, 1250.0, everyday.id, None, wages.id),
            (monday, -(92.4 + variation), everyday.id, Some(alex_groceries.id), groceries.id),
            (
                monday + Duration::days(2),
                -(38.0 + variation),
                credit_card.id,
                Some(alex_fun.id),
                eating_out.id,
            ),
            (
                monday + Duration::days(4),
                -(61.15 - variation),
                credit_card.id,
                Some(alex_groceries.id),
                groceries.id,
            ),
            (monday + Duration::days(1), -350.0, joint.id, Some(sam_household.id), rent.id),
            (
                monday + Duration::days(5),
                -(44.8 + variation),
                joint.id,
                Some(sam_household.id),
                power.id,
            ),
            (monday + Duration::days(6), 3.21, joint.id, None, interest.id),
        ];

        for (date, amount, account_id, budget_id, category_id) in drafts {
            // Skip the rest of the current week.
            if date > today {
                continue;
            }

            upsert_transaction(
                &TransactionDraft {
                    id: None,
                    date,
                    amount,
                    account_id,
                    budget_id,
                    category_id,
                },
                &conn,
            )?;
        }
    }

    println!("Success!");

    Ok(())
}
