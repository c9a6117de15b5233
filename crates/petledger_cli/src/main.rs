//! Operator CLI for the coin ledger.
//!
//! # Responsibility
//! - Open (and migrate) the configured ledger database.
//! - Expose ledger, catalog and mailbox use-cases as subcommands.
//! - Print results as JSON on stdout; errors go to stderr with a non-zero exit.

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use petledger_core::db::migrations::latest_version;
use petledger_core::db::open_db_with;
use petledger_core::{
    init_logging, CatalogService, Coins, ItemId, LedgerConfig, LedgerService, MessageId,
    MessageService, NewItem, NewPetModel, NewUser, PetKind, PetModelId, PetModelService,
    ProfileService, SqliteItemRepository, SqliteLedgerRepository, SqliteMessageRepository,
    SqlitePetModelRepository, SqliteUserRepository, UserId,
};
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "petledger")]
#[command(about = "Coin ledger and note unlock tool", long_about = None)]
struct Cli {
    /// JSON config file; `PETLEDGER_*` env vars override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding config and env.
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or migrate the database
    Init,
    /// Register a user with an opening balance
    AddUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        nickname: String,
        #[arg(long, default_value_t = 0)]
        coins: Coins,
    },
    /// Add a catalog item
    AddItem {
        #[arg(long)]
        name: String,
        #[arg(long)]
        cost: Coins,
        #[arg(long)]
        description: Option<String>,
    },
    /// List catalog items
    Items,
    /// Add a selectable pet model
    AddModel {
        #[arg(long)]
        name: String,
        #[arg(long)]
        path: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        default: bool,
        #[arg(long, default_value_t = 0)]
        sort_order: i64,
    },
    /// List pet models
    Models,
    /// Switch a user's current pet model
    SetModel {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        model: PetModelId,
    },
    /// Deliver a note to a user's mailbox
    IssueNote {
        #[arg(long)]
        user: UserId,
        #[arg(long, default_value_t = 0)]
        coins: Coins,
        #[arg(long)]
        content: String,
    },
    /// Show a user's balance
    Balance {
        #[arg(long)]
        user: UserId,
    },
    /// Credit coins to a user
    Credit {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        amount: Coins,
    },
    /// Spend coins on an item
    UseItem {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        item: ItemId,
    },
    /// Unlock a note
    Unlock {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        message: MessageId,
    },
    /// List a user's mailbox
    Messages {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        notes_only: bool,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        page_size: i64,
    },
    /// List a user's unlock records
    History {
        #[arg(long)]
        user: UserId,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        page_size: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Cat,
    Dog,
}

impl From<KindArg> for PetKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Cat => PetKind::Cat,
            KindArg::Dog => PetKind::Dog,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = LedgerConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let mut conn = open_db_with(&config.db_path, &config.db_options())?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.db_path.display()
    );

    let output = match cli.command {
        Commands::Init => json!({
            "db_path": config.db_path,
            "schema_version": latest_version(),
        }),
        Commands::AddUser {
            username,
            nickname,
            coins,
        } => {
            let service = ProfileService::new(SqliteUserRepository::new(&conn));
            let user = service.register(&NewUser::new(username, nickname).with_coins(coins))?;
            serde_json::to_value(user)?
        }
        Commands::AddItem {
            name,
            cost,
            description,
        } => {
            let service = CatalogService::new(SqliteItemRepository::new(&conn));
            let mut item = NewItem::new(name, cost);
            item.description = description;
            serde_json::to_value(service.add_item(&item)?)?
        }
        Commands::Items => {
            let service = CatalogService::new(SqliteItemRepository::new(&conn));
            serde_json::to_value(service.list_items()?)?
        }
        Commands::AddModel {
            name,
            path,
            kind,
            default,
            sort_order,
        } => {
            let service = PetModelService::new(SqlitePetModelRepository::new(&conn));
            let mut model = NewPetModel::new(name, path, kind.into());
            model.is_default = default;
            model.sort_order = sort_order;
            serde_json::to_value(service.add_pet_model(&model)?)?
        }
        Commands::Models => {
            let service = PetModelService::new(SqlitePetModelRepository::new(&conn));
            serde_json::to_value(service.list_pet_models()?)?
        }
        Commands::SetModel { user, model } => {
            let service = PetModelService::new(SqlitePetModelRepository::new(&conn));
            json!({ "user_id": user, "model": service.select_model(user, model)? })
        }
        Commands::IssueNote {
            user,
            coins,
            content,
        } => {
            let mut service = MessageService::new(SqliteMessageRepository::new(&mut conn));
            serde_json::to_value(service.issue_note(user, coins, content)?)?
        }
        Commands::Balance { user } => {
            let ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
            json!({ "user_id": user, "balance": ledger.balance(user)? })
        }
        Commands::Credit { user, amount } => {
            let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
            json!({ "user_id": user, "balance": ledger.credit_coins(user, amount)? })
        }
        Commands::UseItem { user, item } => {
            let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
            json!({
                "user_id": user,
                "item_id": item,
                "remaining_coins": ledger.spend_on_item(user, item)?,
            })
        }
        Commands::Unlock { user, message } => {
            let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
            let outcome = ledger.unlock_note(user, message)?;
            json!({
                "success": true,
                "remaining_coins": outcome.remaining,
                "message": outcome.message,
                "record": outcome.record,
            })
        }
        Commands::Messages {
            user,
            notes_only,
            page,
            page_size,
        } => {
            let service = MessageService::new(SqliteMessageRepository::new(&mut conn));
            serde_json::to_value(service.list_messages(user, notes_only, page, page_size)?)?
        }
        Commands::History {
            user,
            page,
            page_size,
        } => {
            let ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
            serde_json::to_value(ledger.unlock_history(user, page, page_size)?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
