//! CLI commands for the contracts
//!
//! Each command opens the committed state, performs one operation and
//! prints the outcome.

use crate::core::{parse_amount, Address};
use crate::registry::{MutationPolicy, RectangleInit};
use crate::service::{ContractService, LedgerSetup, ServiceError};
use crate::storage::{FileStore, StateStore, StorageConfig};
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub service: ContractService<FileStore>,
}

impl AppState {
    /// Open the state committed in `data_dir`
    pub fn open(data_dir: &Path) -> CliResult<Self> {
        let store = open_store(data_dir)?;
        let service = ContractService::open_existing(store)?;
        Ok(Self { service })
    }
}

fn open_store(data_dir: &Path) -> CliResult<FileStore> {
    let config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(FileStore::new(config)?)
}

/// Initialize contract state
pub async fn cmd_init(
    data_dir: &Path,
    owner: &str,
    recipient: &str,
    creator_only: bool,
) -> CliResult<()> {
    let store = open_store(data_dir)?;

    if let Some(existing) = store.load()? {
        let ledger = &existing.ledger;
        if ledger.owner() != &Address::new(owner) || ledger.recipient() != &Address::new(recipient)
        {
            return Err(format!(
                "contract state at {:?} belongs to owner {} with recipient {}",
                data_dir,
                ledger.owner(),
                ledger.recipient()
            )
            .into());
        }
        println!("⚠️  Contract state already exists at {:?}", data_dir);
        return Ok(());
    }

    let policy = if creator_only {
        MutationPolicy::CreatorOnly
    } else {
        MutationPolicy::Open
    };
    let setup = LedgerSetup::new(owner, recipient).with_policy(policy);
    let service = ContractService::open(store, &setup)?;

    let stats = service.stats().await;
    println!("✅ Contracts initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🏦 Ledger address: {}", stats.address);
    println!("   👤 Owner: {}", stats.owner);
    println!("   🎯 Recipient: {}", stats.recipient);
    println!("   🔧 Mutation policy: {:?}", policy);

    Ok(())
}

// ============================================================================
// Registry
// ============================================================================

pub async fn cmd_rect_create(
    state: &AppState,
    caller: &str,
    longueur: u64,
    largeur: u64,
) -> CliResult<()> {
    let created = state
        .service
        .create_rectangle(&Address::new(caller), RectangleInit::new(longueur, largeur))
        .await?;

    println!("✅ Rectangle {} created", created.id);
    println!("   ├─ Dimensions: {} x {}", created.state.longueur, created.state.largeur);
    println!("   ├─ Surface: {}", created.state.surface);
    println!("   └─ Perimeter: {}", created.state.perimeter);
    Ok(())
}

pub async fn cmd_rect_get(state: &AppState, id: usize) -> CliResult<()> {
    let view = state.service.get_rectangle(id).await?;

    println!("📐 Rectangle {}", view.id);
    println!("   ├─ Creator: {}", view.creator);
    println!("   ├─ Dimensions: {} x {}", view.state.longueur, view.state.largeur);
    println!("   ├─ Surface: {}", view.state.surface);
    println!("   ├─ Perimeter: {}", view.state.perimeter);
    println!("   └─ Position: ({}, {})", view.state.x, view.state.y);
    Ok(())
}

pub async fn cmd_rect_list(state: &AppState) -> CliResult<()> {
    let rectangles = state.service.list_rectangles().await;

    if rectangles.is_empty() {
        println!("📐 No rectangles created yet.");
        return Ok(());
    }

    println!("📐 Rectangles ({}):", rectangles.len());
    for view in rectangles {
        println!(
            "   #{:<4} {} x {}  surface {}  at ({}, {})  by {}",
            view.id,
            view.state.longueur,
            view.state.largeur,
            view.state.surface,
            view.state.x,
            view.state.y,
            view.creator
        );
    }
    Ok(())
}

pub async fn cmd_rect_resize(
    state: &AppState,
    caller: &str,
    id: usize,
    longueur: u64,
    largeur: u64,
) -> CliResult<()> {
    let changed = state
        .service
        .resize_rectangle(&Address::new(caller), id, longueur, largeur)
        .await?;

    println!(
        "✅ Rectangle {} resized to {} x {} (surface {})",
        changed.id, changed.state.longueur, changed.state.largeur, changed.state.surface
    );
    Ok(())
}

pub async fn cmd_rect_move(
    state: &AppState,
    caller: &str,
    id: usize,
    dx: i64,
    dy: i64,
) -> CliResult<()> {
    let changed = state
        .service
        .move_rectangle(&Address::new(caller), id, dx, dy)
        .await?;

    println!(
        "✅ Rectangle {} moved to ({}, {})",
        changed.id, changed.state.x, changed.state.y
    );
    Ok(())
}

pub async fn cmd_rect_area(state: &AppState) -> CliResult<()> {
    let count = state.service.rectangle_count().await;
    let total = state.service.total_surface().await;

    println!("📐 Total surface of {} rectangle(s): {}", count, total);
    Ok(())
}

// ============================================================================
// Ledger
// ============================================================================

pub async fn cmd_deposit(state: &AppState, caller: &str, amount: &str) -> CliResult<()> {
    let amount = parse_amount(amount).map_err(ServiceError::from)?;
    let deposited = state
        .service
        .deposit(&Address::new(caller), amount)
        .await?;

    println!("✅ Deposited {} from {}", deposited.amount, deposited.depositor);
    println!("   Pool balance: {}", state.service.stats().await.pool_balance);
    Ok(())
}

pub async fn cmd_withdraw(state: &AppState, caller: &str, amount: Option<&str>) -> CliResult<()> {
    let caller = Address::new(caller);

    let withdrawn = match amount {
        Some(amount) => {
            let amount = parse_amount(amount).map_err(ServiceError::from)?;
            state.service.withdraw_amount(&caller, amount).await?
        }
        None => state.service.withdraw(&caller).await?,
    };

    println!("✅ Withdrew {} to {}", withdrawn.amount, withdrawn.recipient);
    println!("   Pool balance: {}", state.service.stats().await.pool_balance);
    Ok(())
}

pub async fn cmd_stats(state: &AppState) -> CliResult<()> {
    let stats = state.service.stats().await;

    println!("🏦 Ledger {}", stats.address);
    println!("   ├─ Owner: {}", stats.owner);
    println!("   ├─ Recipient: {}", stats.recipient);
    println!("   ├─ Pool balance: {}", stats.pool_balance);
    println!("   ├─ Total received: {}", stats.total_received);
    println!("   ├─ Total withdrawn: {}", stats.total_withdrawn);
    println!("   ├─ Depositors: {}", stats.depositor_count);
    println!("   └─ Halted: {}", stats.halted);
    Ok(())
}

pub async fn cmd_depositor(state: &AppState, index: usize) -> CliResult<()> {
    let depositor = state.service.get_depositor(index).await?;
    println!(
        "👤 Depositor #{}: {} (cumulative {})",
        index, depositor.address, depositor.cumulative
    );
    Ok(())
}

pub async fn cmd_depositors(state: &AppState) -> CliResult<()> {
    let depositors = state.service.depositors().await;

    if depositors.is_empty() {
        println!("👤 No deposits yet.");
        return Ok(());
    }

    println!("👤 Depositors ({}):", depositors.len());
    for (index, depositor) in depositors.iter().enumerate() {
        println!(
            "   #{:<4} {}  {}",
            index, depositor.address, depositor.cumulative
        );
    }
    Ok(())
}

pub async fn cmd_change_recipient(
    state: &AppState,
    caller: &str,
    recipient: &str,
) -> CliResult<()> {
    let changed = state
        .service
        .change_recipient(&Address::new(caller), Address::new(recipient))
        .await?;

    println!(
        "✅ Recipient changed: {} → {}",
        changed.previous, changed.current
    );
    Ok(())
}

pub async fn cmd_halt(state: &AppState, caller: &str, halted: bool) -> CliResult<()> {
    let caller = Address::new(caller);
    let changed = if halted {
        state.service.halt(&caller).await?
    } else {
        state.service.resume(&caller).await?
    };

    if changed.halted {
        println!("⏸️  Ledger halted");
    } else {
        println!("▶️  Ledger resumed");
    }
    Ok(())
}
