//! Escrow-registry CLI application
//!
//! A command-line interface for the rectangle registry and the escrow ledger.

use clap::{Parser, Subcommand};
use escrow_registry::api::{create_router, ApiState};
use escrow_registry::cli::{self, AppState};
use escrow_registry::service::ContractService;
use escrow_registry::storage::{FileStore, StateStore, StorageConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "escrow")]
#[command(version = "0.1.0")]
#[command(about = "Rectangle registry and escrow ledger", long_about = None)]
struct Cli {
    /// Data directory for contract state
    #[arg(short, long, default_value = ".escrow_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize contract state
    Init {
        /// Ledger owner address
        #[arg(short, long)]
        owner: String,

        /// Initial recipient address
        #[arg(short, long)]
        recipient: String,

        /// Only the creator of a rectangle may change it
        #[arg(long)]
        creator_only: bool,
    },

    /// Rectangle registry operations
    Rect {
        #[command(subcommand)]
        action: RectCommands,
    },

    /// Escrow ledger operations
    Ledger {
        #[command(subcommand)]
        action: LedgerCommands,
    },

    /// REST API server
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum RectCommands {
    /// Create a rectangle
    Create {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        longueur: u64,

        #[arg(short = 'w', long)]
        largeur: u64,
    },

    /// Show a rectangle
    Get {
        /// Rectangle index
        id: usize,
    },

    /// List all rectangles
    List,

    /// Resize a rectangle
    Resize {
        #[arg(short, long)]
        caller: String,

        /// Rectangle index
        id: usize,

        #[arg(short, long)]
        longueur: u64,

        #[arg(short = 'w', long)]
        largeur: u64,
    },

    /// Move a rectangle by an offset
    Move {
        #[arg(short, long)]
        caller: String,

        /// Rectangle index
        id: usize,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        dx: i64,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        dy: i64,
    },

    /// Total surface of all rectangles
    Area,
}

#[derive(Subcommand)]
enum LedgerCommands {
    /// Deposit into the pool
    Deposit {
        #[arg(short, long)]
        caller: String,

        /// Amount to deposit
        #[arg(short, long, allow_hyphen_values = true)]
        amount: String,
    },

    /// Withdraw the pool (or part of it) to the recipient
    Withdraw {
        #[arg(short, long)]
        caller: String,

        /// Amount to withdraw; the whole pool when omitted
        #[arg(short, long)]
        amount: Option<String>,
    },

    /// Show ledger statistics
    Stats,

    /// Show a depositor by index
    Depositor {
        /// Depositor index
        index: usize,
    },

    /// List depositors
    Depositors,

    /// Change the recipient
    Recipient {
        #[arg(short, long)]
        caller: String,

        /// New recipient address
        #[arg(short, long)]
        recipient: String,
    },

    /// Halt deposits and withdrawals
    Halt {
        #[arg(short, long)]
        caller: String,
    },

    /// Resume deposits and withdrawals
    Resume {
        #[arg(short, long)]
        caller: String,
    },
}

#[derive(Subcommand)]
enum ApiCommands {
    /// Start the REST API server
    Start {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> cli::CliResult<()> {
    match cli.command {
        Commands::Init {
            owner,
            recipient,
            creator_only,
        } => cli::cmd_init(&cli.data_dir, &owner, &recipient, creator_only).await,
        Commands::Api { action } => run_api_command(&action, &cli.data_dir).await,
        Commands::Rect { action } => {
            let state = AppState::open(&cli.data_dir)?;
            run_rect_command(&state, action).await
        }
        Commands::Ledger { action } => {
            let state = AppState::open(&cli.data_dir)?;
            run_ledger_command(&state, action).await
        }
    }
}

async fn run_rect_command(state: &AppState, action: RectCommands) -> cli::CliResult<()> {
    match action {
        RectCommands::Create {
            caller,
            longueur,
            largeur,
        } => cli::cmd_rect_create(state, &caller, longueur, largeur).await,
        RectCommands::Get { id } => cli::cmd_rect_get(state, id).await,
        RectCommands::List => cli::cmd_rect_list(state).await,
        RectCommands::Resize {
            caller,
            id,
            longueur,
            largeur,
        } => cli::cmd_rect_resize(state, &caller, id, longueur, largeur).await,
        RectCommands::Move { caller, id, dx, dy } => {
            cli::cmd_rect_move(state, &caller, id, dx, dy).await
        }
        RectCommands::Area => cli::cmd_rect_area(state).await,
    }
}

async fn run_ledger_command(state: &AppState, action: LedgerCommands) -> cli::CliResult<()> {
    match action {
        LedgerCommands::Deposit { caller, amount } => {
            cli::cmd_deposit(state, &caller, &amount).await
        }
        LedgerCommands::Withdraw { caller, amount } => {
            cli::cmd_withdraw(state, &caller, amount.as_deref()).await
        }
        LedgerCommands::Stats => cli::cmd_stats(state).await,
        LedgerCommands::Depositor { index } => cli::cmd_depositor(state, index).await,
        LedgerCommands::Depositors => cli::cmd_depositors(state).await,
        LedgerCommands::Recipient { caller, recipient } => {
            cli::cmd_change_recipient(state, &caller, &recipient).await
        }
        LedgerCommands::Halt { caller } => cli::cmd_halt(state, &caller, true).await,
        LedgerCommands::Resume { caller } => cli::cmd_halt(state, &caller, false).await,
    }
}

async fn run_api_command(action: &ApiCommands, data_dir: &Path) -> cli::CliResult<()> {
    match action {
        ApiCommands::Start { port } => {
            let config = StorageConfig {
                data_dir: data_dir.to_path_buf(),
                ..Default::default()
            };
            let store: Box<dyn StateStore> = Box::new(FileStore::new(config)?);

            println!("📂 Loading contract state from {:?}...", data_dir);
            let service = ContractService::open_existing(store)?;
            let state = ApiState::new(Arc::new(service));

            let app = create_router(state);

            let addr = format!("0.0.0.0:{}", port);
            println!("🚀 REST API server starting on http://localhost:{}", port);
            println!();
            println!("📖 Available endpoints:");
            println!("   GET  /health                          - Health check");
            println!("   GET  /ws                              - Live notifications");
            println!("   GET  /api/rectangles                  - List rectangles");
            println!("   POST /api/rectangles                  - Create rectangle");
            println!("   GET  /api/rectangles/{{id}}             - Get rectangle");
            println!("   POST /api/rectangles/{{id}}/resize      - Resize rectangle");
            println!("   POST /api/rectangles/{{id}}/move        - Move rectangle");
            println!("   GET  /api/rectangles/area             - Total surface");
            println!("   GET  /api/ledger                      - Ledger statistics");
            println!("   POST /api/ledger/deposit              - Deposit");
            println!("   POST /api/ledger/withdraw             - Withdraw");
            println!("   POST /api/ledger/recipient            - Change recipient");
            println!("   POST /api/ledger/halt                 - Halt ledger");
            println!("   POST /api/ledger/resume               - Resume ledger");
            println!("   GET  /api/ledger/depositors           - List depositors");
            println!("   GET  /api/ledger/depositors/{{index}}   - Get depositor");
            println!("   GET  /api/notifications?since=N       - Notifications");
            println!();

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                    println!("\n📴 Shutting down API server...");
                })
                .await?;
        }
    }

    Ok(())
}
