use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "merch_admin")]
#[command(about = "Admin utilities for the merch store (users and catalog)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./merch_store.db?mode=rwc"
    )]
    database_url: String,

    /// Coins credited to users created from here.
    #[arg(long, default_value_t = engine::STARTING_BALANCE)]
    starting_balance: i64,

    /// Must match the server's pepper, or created users cannot log in.
    #[arg(long, env = "MERCH_STORE__PASSWORD_HASH__PEPPER", default_value = "")]
    pepper: String,

    #[arg(
        long,
        env = "MERCH_STORE__PASSWORD_HASH__BCRYPT_COST",
        default_value_t = server::DEFAULT_BCRYPT_COST
    )]
    bcrypt_cost: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Merch(Merch),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Merch {
    #[command(subcommand)]
    command: MerchCommand,
}

#[derive(Subcommand, Debug)]
enum MerchCommand {
    Add(MerchAddArgs),
    List,
}

#[derive(Args, Debug)]
struct MerchAddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    price: i64,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let first = prompt_password("Password: ")?;
        if first.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let second = prompt_password("Confirm password: ")?;
        if first == second {
            return Ok(first);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .starting_balance(cli.starting_balance)
        .build()
        .await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            let password_hash =
                server::PasswordHasher::new(cli.pepper, cli.bcrypt_cost).hash(&password)?;
            match engine.register_account(&args.username, &password_hash).await
            {
                Ok(account) => println!(
                    "created user: {} ({}) with {} coins",
                    account.username, account.id, account.balance
                ),
                Err(EngineError::ExistingKey(_)) => {
                    eprintln!("user already exists: {}", args.username);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::User(User {
            command: UserCommand::List,
        }) => {
            for account in engine.list_accounts().await? {
                println!("{}\t{}\t{}", account.username, account.balance, account.id);
            }
        }
        Command::Merch(Merch {
            command: MerchCommand::Add(args),
        }) => match engine.add_merch(&args.name, args.price).await {
            Ok(item) => println!("added merch: {} ({} coins)", item.name, item.price),
            Err(EngineError::ExistingKey(_)) => {
                eprintln!("merch already exists: {}", args.name);
                std::process::exit(1);
            }
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(2);
            }
        },
        Command::Merch(Merch {
            command: MerchCommand::List,
        }) => {
            for item in engine.list_merch().await? {
                println!("{}\t{}", item.name, item.price);
            }
        }
    }

    Ok(())
}
