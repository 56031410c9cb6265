//! End-to-end scenarios through the public service API

use escrow_registry::core::{Address, ContractError, Role};
use escrow_registry::events::Event;
use escrow_registry::escrow::LedgerEvent;
use escrow_registry::registry::{MutationPolicy, RectangleInit};
use escrow_registry::service::{ContractService, LedgerSetup, ServiceError};
use escrow_registry::storage::{FileStore, MemoryStore};

fn addr(name: &str) -> Address {
    Address::new(name)
}

fn open() -> ContractService<MemoryStore> {
    ContractService::open(MemoryStore::new(), &LedgerSetup::new("owner", "recipient")).unwrap()
}

fn contract_error(err: ServiceError) -> ContractError {
    err.contract_error().cloned().expect("contract error")
}

#[tokio::test]
async fn test_pool_matches_sum_of_contributions() {
    let service = open();

    for (name, amount) in [("a", 10), ("b", 25), ("a", 5), ("c", 1)] {
        service.deposit(&addr(name), amount).await.unwrap();
    }
    service
        .withdraw_amount(&addr("recipient"), 11)
        .await
        .unwrap();

    let stats = service.stats().await;
    let contributed: u128 = service
        .depositors()
        .await
        .iter()
        .map(|d| d.cumulative)
        .sum();

    assert_eq!(contributed, stats.total_received);
    assert_eq!(stats.pool_balance, stats.total_received - stats.total_withdrawn);
    assert_eq!(stats.pool_balance, 30);
}

#[tokio::test]
async fn test_zero_deposit_changes_nothing() {
    let service = open();
    let before = service.stats().await;

    let err = contract_error(service.deposit(&addr("alice"), 0).await.unwrap_err());
    assert!(matches!(err, ContractError::InvalidArgument(_)));

    assert_eq!(service.stats().await, before);
    assert_eq!(service.next_sequence().await, 0);
}

#[tokio::test]
async fn test_only_recipient_withdraws() {
    let service = open();
    service.deposit(&addr("alice"), 70).await.unwrap();

    let err = contract_error(service.withdraw(&addr("alice")).await.unwrap_err());
    assert_eq!(
        err,
        ContractError::Unauthorized {
            caller: addr("alice"),
            required: Role::Recipient,
        }
    );

    let withdrawn = service.withdraw(&addr("recipient")).await.unwrap();
    assert_eq!(withdrawn.amount, 70);
    assert_eq!(service.stats().await.pool_balance, 0);
    assert_eq!(service.payouts().await.len(), 1);
}

#[tokio::test]
async fn test_depositor_counted_once() {
    let service = open();

    service.deposit(&addr("alice"), 1).await.unwrap();
    service.deposit(&addr("alice"), 2).await.unwrap();
    service.deposit(&addr("bob"), 3).await.unwrap();

    let stats = service.stats().await;
    assert_eq!(stats.depositor_count, 2);
    assert_eq!(service.contribution_of(&addr("alice")).await, 3);
    assert_eq!(service.get_depositor(1).await.unwrap().address, addr("bob"));
}

#[tokio::test]
async fn test_rectangle_lifecycle() {
    let service = open();

    let err = contract_error(
        service
            .create_rectangle(&addr("alice"), RectangleInit::new(0, 5))
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, ContractError::InvalidArgument(_)));
    assert_eq!(service.rectangle_count().await, 0);

    service
        .create_rectangle(&addr("alice"), RectangleInit::new(3, 4))
        .await
        .unwrap();
    let view = service.get_rectangle(0).await.unwrap();
    assert_eq!(view.state.surface, 12);
    assert_eq!(view.state.perimeter, 14);

    let err = contract_error(service.get_rectangle(1).await.unwrap_err());
    assert_eq!(err, ContractError::OutOfRange { index: 1, len: 1 });

    let err = contract_error(
        service
            .resize_rectangle(&addr("alice"), 5, 1, 1)
            .await
            .unwrap_err(),
    );
    assert_eq!(err, ContractError::OutOfRange { index: 5, len: 1 });

    service
        .create_rectangle(&addr("bob"), RectangleInit::new(2, 2))
        .await
        .unwrap();
    assert_eq!(service.total_surface().await, 16);
}

#[tokio::test]
async fn test_two_depositors_then_double_withdraw() {
    let service = open();

    service.deposit(&addr("a"), 100).await.unwrap();
    service.deposit(&addr("b"), 50).await.unwrap();

    let withdrawn = service.withdraw(&addr("recipient")).await.unwrap();
    assert_eq!(withdrawn.amount, 150);

    let stats = service.stats().await;
    assert_eq!(stats.pool_balance, 0);
    assert_eq!(stats.total_received, 150);
    assert_eq!(stats.total_withdrawn, 150);
    assert_eq!(stats.depositor_count, 2);

    let err = contract_error(service.withdraw(&addr("recipient")).await.unwrap_err());
    assert!(matches!(err, ContractError::InsufficientFunds { .. }));
    assert_eq!(service.stats().await, stats);
}

#[tokio::test]
async fn test_change_recipient_moves_withdrawal_right() {
    let service = open();
    service.deposit(&addr("alice"), 40).await.unwrap();

    let err = contract_error(
        service
            .change_recipient(&addr("recipient"), addr("carol"))
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, ContractError::Unauthorized { .. }));

    service
        .change_recipient(&addr("owner"), addr("carol"))
        .await
        .unwrap();

    let err = contract_error(service.withdraw(&addr("recipient")).await.unwrap_err());
    assert!(matches!(err, ContractError::Unauthorized { .. }));

    let withdrawn = service.withdraw(&addr("carol")).await.unwrap();
    assert_eq!(withdrawn.recipient, addr("carol"));
    assert_eq!(withdrawn.amount, 40);
}

#[tokio::test]
async fn test_halt_blocks_money_movement() {
    let service = open();
    service.deposit(&addr("alice"), 10).await.unwrap();
    service.halt(&addr("owner")).await.unwrap();

    let err = contract_error(service.deposit(&addr("alice"), 5).await.unwrap_err());
    assert_eq!(err, ContractError::Halted);
    let err = contract_error(service.withdraw(&addr("recipient")).await.unwrap_err());
    assert_eq!(err, ContractError::Halted);

    // Registry is unaffected by the halt flag
    service
        .create_rectangle(&addr("alice"), RectangleInit::new(1, 1))
        .await
        .unwrap();

    service.resume(&addr("owner")).await.unwrap();
    assert_eq!(service.withdraw(&addr("recipient")).await.unwrap().amount, 10);
}

#[tokio::test]
async fn test_notifications_follow_commit_order() {
    let service = open();
    let mut rx = service.subscribe();

    service.deposit(&addr("alice"), 5).await.unwrap();
    service
        .create_rectangle(&addr("alice"), RectangleInit::new(2, 3))
        .await
        .unwrap();
    let _ = service.deposit(&addr("alice"), 0).await;

    let retained = service.notifications_since(0).await;
    assert_eq!(retained.len(), 2);
    assert_eq!(retained[0].sequence, 0);
    assert!(matches!(
        retained[0].event,
        Event::Ledger(LedgerEvent::Deposited(_))
    ));
    assert!(matches!(retained[1].event, Event::Registry(_)));

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!((first.sequence, second.sequence), (0, 1));
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = tempfile::tempdir().unwrap();
    let setup = LedgerSetup::new("owner", "recipient").with_policy(MutationPolicy::CreatorOnly);

    {
        let store = FileStore::in_dir(temp_dir.path()).unwrap();
        let service = ContractService::open(store, &setup).unwrap();
        service.deposit(&addr("alice"), 100).await.unwrap();
        service
            .create_rectangle(&addr("alice"), RectangleInit::new(3, 4))
            .await
            .unwrap();
        service
            .withdraw_amount(&addr("recipient"), 30)
            .await
            .unwrap();
    }

    let store = FileStore::in_dir(temp_dir.path()).unwrap();
    let service = ContractService::open_existing(store).unwrap();

    let stats = service.stats().await;
    assert_eq!(stats.pool_balance, 70);
    assert_eq!(stats.total_withdrawn, 30);
    assert_eq!(service.total_surface().await, 12);

    let err = contract_error(
        service
            .resize_rectangle(&addr("bob"), 0, 1, 1)
            .await
            .unwrap_err(),
    );
    assert_eq!(
        err,
        ContractError::Unauthorized {
            caller: addr("bob"),
            required: Role::Creator,
        }
    );
}
