use std::io::Write;
use std::path::Path;

use clap::Subcommand;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::config::Config;
use crate::errors::ServerError;
use crate::models::NewNote;
use crate::schema::notes::dsl::notes;
use crate::MIGRATIONS;

const ENV_FILE: &str = ".env";

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Initialize the .env file with some default values
    InitEnv,
    /// Print an SQL script to initialize the PostgreSQL database
    InitPgsql,
    /// Drop everything from the database and recreate the schema
    RecreateDb,
    /// Generate some random notes
    SeedDb {
        /// How many notes to insert
        #[arg(long, default_value_t = 10_000)]
        count: usize,
    },
}

pub fn run(command: AdminCommand) -> Result<(), ServerError> {
    match command {
        AdminCommand::InitEnv => init_env(),
        AdminCommand::InitPgsql => init_pgsql(),
        AdminCommand::RecreateDb => recreate_db(),
        AdminCommand::SeedDb { count } => seed_db(count),
    }
}

fn init_env() -> Result<(), ServerError> {
    if Path::new(ENV_FILE).is_file() {
        println!("File {} already exists", ENV_FILE);
        return Ok(());
    }

    let username = "notes_app";
    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let db_name = "notes_db";
    let db_host = "localhost";

    let mut file = std::fs::File::create(ENV_FILE)?;
    writeln!(file, "DATABASE_USERNAME={}", username)?;
    writeln!(file, "DATABASE_PASSWORD={}", password)?;
    writeln!(file, "DATABASE_NAME={}", db_name)?;
    writeln!(
        file,
        "# DATABASE_URL=\"postgresql://{}:{}@{}/{}\"",
        username, password, db_host, db_name
    )?;
    writeln!(file, "# CACHE_MEMCACHED_SERVERS=localhost:11211")?;
    println!("{} file inited", ENV_FILE);
    Ok(())
}

fn init_pgsql() -> Result<(), ServerError> {
    if !Path::new(ENV_FILE).is_file() {
        println!("File {} should exist", ENV_FILE);
        return Ok(());
    }

    let username = std::env::var("DATABASE_USERNAME")?;
    let password = std::env::var("DATABASE_PASSWORD")?;
    let db_name = std::env::var("DATABASE_NAME")?;
    println!("sudo -iu postgres psql << EOF");
    println!("CREATE DATABASE {};", db_name);
    println!("CREATE USER {} WITH PASSWORD '{}';", username, password);
    println!("GRANT ALL PRIVILEGES ON DATABASE {} to {};", db_name, username);
    println!("ALTER DATABASE {} OWNER TO {};", db_name, username);
    println!("EOF");
    Ok(())
}

fn recreate_db() -> Result<(), ServerError> {
    let config = Config::from_env()?;
    let mut connection = PgConnection::establish(&config.database_url)?;
    connection
        .revert_all_migrations(MIGRATIONS)
        .map_err(|_| ServerError::MigrationError)?;
    connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|_| ServerError::MigrationError)?;
    println!("Database reinitialized");
    Ok(())
}

fn seed_db(count: usize) -> Result<(), ServerError> {
    let config = Config::from_env()?;
    let mut connection = PgConnection::establish(&config.database_url)?;
    connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|_| ServerError::MigrationError)?;

    let server_name = config.hostname();
    let rows: Vec<NewNote> = (1..=count)
        .map(|i| NewNote::now(format!("New note #{}", i), server_name.clone()))
        .collect();
    diesel::insert_into(notes)
        .values(&rows)
        .execute(&mut connection)?;
    println!("Database seeded");
    Ok(())
}
