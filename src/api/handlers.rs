//! REST API handlers for registry and ledger operations

use crate::core::{parse_amount, Address, ContractError};
use crate::escrow::{Deposited, Depositor, LedgerStats, Withdrawn};
use crate::events::Notification;
use crate::registry::{
    EntityChanged, EntityCreated, EntityView, RectangleInit, RectangleSnapshot,
};
use crate::service::{ContractService, ServiceError};
use crate::storage::StateStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Service type shared by all handlers
pub type SharedService = Arc<ContractService<Box<dyn StateStore>>>;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: SharedService,
}

impl ApiState {
    pub fn new(service: SharedService) -> Self {
        Self { service }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiError {
    pub error: String,
    pub kind: String,
}

impl From<ServiceError> for (StatusCode, Json<ApiError>) {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Contract(ContractError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ServiceError::Contract(ContractError::OutOfRange { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Contract(ContractError::Unauthorized { .. }) => StatusCode::FORBIDDEN,
            ServiceError::Contract(ContractError::InsufficientFunds { .. }) => StatusCode::CONFLICT,
            ServiceError::Contract(ContractError::Halted) => StatusCode::LOCKED,
            ServiceError::Storage(_) | ServiceError::NotInitialized => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ApiError {
                error: err.to_string(),
                kind: err.kind().to_string(),
            }),
        )
    }
}

impl From<ContractError> for (StatusCode, Json<ApiError>) {
    fn from(err: ContractError) -> Self {
        ServiceError::from(err).into()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RectangleInfo {
    pub id: usize,
    pub creator: String,
    pub created_at: String,
    pub longueur: u64,
    pub largeur: u64,
    pub surface: String,
    pub perimeter: String,
    pub x: i64,
    pub y: i64,
}

impl From<EntityView<RectangleSnapshot>> for RectangleInfo {
    fn from(view: EntityView<RectangleSnapshot>) -> Self {
        Self {
            id: view.id,
            creator: view.creator.to_string(),
            created_at: view.created_at.to_rfc3339(),
            longueur: view.state.longueur,
            largeur: view.state.largeur,
            surface: view.state.surface.to_string(),
            perimeter: view.state.perimeter.to_string(),
            x: view.state.x,
            y: view.state.y,
        }
    }
}

impl From<EntityCreated<RectangleSnapshot>> for RectangleInfo {
    fn from(event: EntityCreated<RectangleSnapshot>) -> Self {
        EntityView {
            id: event.id,
            creator: event.creator,
            created_at: event.timestamp,
            state: event.state,
        }
        .into()
    }
}

impl From<EntityChanged<RectangleSnapshot>> for RectangleInfo {
    fn from(event: EntityChanged<RectangleSnapshot>) -> Self {
        EntityView {
            id: event.id,
            creator: event.creator,
            created_at: event.created_at,
            state: event.state,
        }
        .into()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AreaResponse {
    pub count: usize,
    pub total_surface: String,
}

/// Ledger stats with amounts as decimal strings
#[derive(Serialize, Deserialize, Debug)]
pub struct StatsResponse {
    pub address: String,
    pub pool_balance: String,
    pub total_received: String,
    pub total_withdrawn: String,
    pub depositor_count: usize,
    pub recipient: String,
    pub owner: String,
    pub halted: bool,
}

impl From<LedgerStats> for StatsResponse {
    fn from(stats: LedgerStats) -> Self {
        Self {
            address: stats.address.to_string(),
            pool_balance: stats.pool_balance.to_string(),
            total_received: stats.total_received.to_string(),
            total_withdrawn: stats.total_withdrawn.to_string(),
            depositor_count: stats.depositor_count,
            recipient: stats.recipient.to_string(),
            owner: stats.owner.to_string(),
            halted: stats.halted,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DepositorInfo {
    pub index: usize,
    pub address: String,
    pub cumulative: String,
}

impl DepositorInfo {
    fn new(index: usize, depositor: Depositor) -> Self {
        Self {
            index,
            address: depositor.address.to_string(),
            cumulative: depositor.cumulative.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TransferResponse {
    pub success: bool,
    pub account: String,
    pub amount: String,
    pub timestamp: String,
}

impl From<Deposited> for TransferResponse {
    fn from(event: Deposited) -> Self {
        Self {
            success: true,
            account: event.depositor.to_string(),
            amount: event.amount.to_string(),
            timestamp: event.timestamp.to_rfc3339(),
        }
    }
}

impl From<Withdrawn> for TransferResponse {
    fn from(event: Withdrawn) -> Self {
        Self {
            success: true,
            account: event.recipient.to_string(),
            amount: event.amount.to_string(),
            timestamp: event.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RecipientResponse {
    pub previous: String,
    pub recipient: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HaltResponse {
    pub halted: bool,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct CreateRectangleRequest {
    pub caller: String,
    pub longueur: u64,
    pub largeur: u64,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

#[derive(Deserialize)]
pub struct ResizeRequest {
    pub caller: String,
    pub longueur: u64,
    pub largeur: u64,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub caller: String,
    pub dx: i64,
    pub dy: i64,
}

#[derive(Deserialize)]
pub struct DepositRequest {
    pub caller: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct WithdrawRequest {
    pub caller: String,
    /// Omit to withdraw the whole pool
    pub amount: Option<String>,
}

#[derive(Deserialize)]
pub struct RecipientRequest {
    pub caller: String,
    pub recipient: String,
}

#[derive(Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

#[derive(Deserialize)]
pub struct NotificationsQuery {
    pub since: Option<u64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/rectangles - List all rectangles
pub async fn list_rectangles(State(state): State<ApiState>) -> Json<Vec<RectangleInfo>> {
    let rectangles = state
        .service
        .list_rectangles()
        .await
        .into_iter()
        .map(RectangleInfo::from)
        .collect();
    Json(rectangles)
}

/// POST /api/rectangles - Create a rectangle
pub async fn create_rectangle(
    State(state): State<ApiState>,
    Json(req): Json<CreateRectangleRequest>,
) -> ApiResult<RectangleInfo> {
    let caller = Address::new(req.caller);
    let init = RectangleInit {
        longueur: req.longueur,
        largeur: req.largeur,
        x: req.x,
        y: req.y,
    };

    let created = state.service.create_rectangle(&caller, init).await?;
    Ok(Json(created.into()))
}

/// GET /api/rectangles/{id} - Get one rectangle
pub async fn get_rectangle(
    State(state): State<ApiState>,
    Path(id): Path<usize>,
) -> ApiResult<RectangleInfo> {
    let view = state.service.get_rectangle(id).await?;
    Ok(Json(view.into()))
}

/// POST /api/rectangles/{id}/resize - Change dimensions
pub async fn resize_rectangle(
    State(state): State<ApiState>,
    Path(id): Path<usize>,
    Json(req): Json<ResizeRequest>,
) -> ApiResult<RectangleInfo> {
    let caller = Address::new(req.caller);
    let changed = state
        .service
        .resize_rectangle(&caller, id, req.longueur, req.largeur)
        .await?;
    Ok(Json(changed.into()))
}

/// POST /api/rectangles/{id}/move - Translate a rectangle
pub async fn move_rectangle(
    State(state): State<ApiState>,
    Path(id): Path<usize>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<RectangleInfo> {
    let caller = Address::new(req.caller);
    let changed = state
        .service
        .move_rectangle(&caller, id, req.dx, req.dy)
        .await?;
    Ok(Json(changed.into()))
}

/// GET /api/rectangles/area - Total surface
pub async fn total_surface(State(state): State<ApiState>) -> Json<AreaResponse> {
    Json(AreaResponse {
        count: state.service.rectangle_count().await,
        total_surface: state.service.total_surface().await.to_string(),
    })
}

/// GET /api/ledger - Ledger statistics
pub async fn get_stats(State(state): State<ApiState>) -> Json<StatsResponse> {
    Json(state.service.stats().await.into())
}

/// POST /api/ledger/deposit - Deposit into the pool
pub async fn deposit(
    State(state): State<ApiState>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<TransferResponse> {
    let amount = parse_amount(&req.amount)?;
    let caller = Address::new(req.caller);

    let deposited = state.service.deposit(&caller, amount).await?;
    Ok(Json(deposited.into()))
}

/// POST /api/ledger/withdraw - Withdraw all or part of the pool
pub async fn withdraw(
    State(state): State<ApiState>,
    Json(req): Json<WithdrawRequest>,
) -> ApiResult<TransferResponse> {
    let caller = Address::new(req.caller);

    let withdrawn = match req.amount {
        Some(amount) => {
            let amount = parse_amount(&amount)?;
            state.service.withdraw_amount(&caller, amount).await?
        }
        None => state.service.withdraw(&caller).await?,
    };
    Ok(Json(withdrawn.into()))
}

/// POST /api/ledger/recipient - Change the recipient
pub async fn change_recipient(
    State(state): State<ApiState>,
    Json(req): Json<RecipientRequest>,
) -> ApiResult<RecipientResponse> {
    let caller = Address::new(req.caller);

    let changed = state
        .service
        .change_recipient(&caller, Address::new(req.recipient))
        .await?;
    Ok(Json(RecipientResponse {
        previous: changed.previous.to_string(),
        recipient: changed.current.to_string(),
    }))
}

/// POST /api/ledger/halt - Halt deposits and withdrawals
pub async fn halt(
    State(state): State<ApiState>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<HaltResponse> {
    let changed = state.service.halt(&Address::new(req.caller)).await?;
    Ok(Json(HaltResponse {
        halted: changed.halted,
    }))
}

/// POST /api/ledger/resume - Lift a halt
pub async fn resume(
    State(state): State<ApiState>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<HaltResponse> {
    let changed = state.service.resume(&Address::new(req.caller)).await?;
    Ok(Json(HaltResponse {
        halted: changed.halted,
    }))
}

/// GET /api/ledger/depositors - All depositors
pub async fn list_depositors(State(state): State<ApiState>) -> Json<Vec<DepositorInfo>> {
    let depositors = state
        .service
        .depositors()
        .await
        .into_iter()
        .enumerate()
        .map(|(index, d)| DepositorInfo::new(index, d))
        .collect();
    Json(depositors)
}

/// GET /api/ledger/depositors/{index} - One depositor
pub async fn get_depositor(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
) -> ApiResult<DepositorInfo> {
    let depositor = state.service.get_depositor(index).await?;
    Ok(Json(DepositorInfo::new(index, depositor)))
}

/// GET /api/notifications?since=N - Retained notifications
pub async fn list_notifications(
    State(state): State<ApiState>,
    Query(query): Query<NotificationsQuery>,
) -> Json<Vec<Notification>> {
    let since = query.since.unwrap_or(0);
    Json(state.service.notifications_since(since).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::LedgerSetup;
    use crate::storage::MemoryStore;

    fn test_state() -> ApiState {
        let store: Box<dyn StateStore> = Box::new(MemoryStore::new());
        let service = ContractService::open(store, &LedgerSetup::new("owner", "recipient")).unwrap();
        ApiState::new(Arc::new(service))
    }

    fn deposit_request(caller: &str, amount: &str) -> Json<DepositRequest> {
        Json(DepositRequest {
            caller: caller.to_string(),
            amount: amount.to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_and_get_rectangle() {
        let state = test_state();

        let Json(info) = create_rectangle(
            State(state.clone()),
            Json(CreateRectangleRequest {
                caller: "alice".to_string(),
                longueur: 3,
                largeur: 4,
                x: 0,
                y: 0,
            }),
        )
        .await
        .unwrap();

        assert_eq!(info.id, 0);
        assert_eq!(info.surface, "12");
        assert_eq!(info.perimeter, "14");

        let Json(info) = get_rectangle(State(state.clone()), Path(0)).await.unwrap();
        assert_eq!(info.creator, "alice");

        let (status, Json(error)) = get_rectangle(State(state), Path(1)).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error.kind, "out_of_range");
    }

    #[tokio::test]
    async fn test_change_responses_come_from_the_commit() {
        let state = test_state();

        let Json(created) = create_rectangle(
            State(state.clone()),
            Json(CreateRectangleRequest {
                caller: "alice".to_string(),
                longueur: 3,
                largeur: 4,
                x: 0,
                y: 0,
            }),
        )
        .await
        .unwrap();

        let Json(resized) = resize_rectangle(
            State(state.clone()),
            Path(0),
            Json(ResizeRequest {
                caller: "bob".to_string(),
                longueur: 5,
                largeur: 6,
            }),
        )
        .await
        .unwrap();

        assert_eq!(resized.creator, "alice");
        assert_eq!(resized.created_at, created.created_at);
        assert_eq!(resized.surface, "30");

        // A later change is not reflected in an earlier response
        let Json(moved) = move_rectangle(
            State(state.clone()),
            Path(0),
            Json(MoveRequest {
                caller: "bob".to_string(),
                dx: 2,
                dy: -1,
            }),
        )
        .await
        .unwrap();

        assert_eq!((moved.x, moved.y), (2, -1));
        assert_eq!((resized.x, resized.y), (0, 0));
        assert_eq!(moved.surface, "30");
    }

    #[tokio::test]
    async fn test_invalid_rectangle_is_bad_request() {
        let state = test_state();

        let (status, Json(error)) = create_rectangle(
            State(state),
            Json(CreateRectangleRequest {
                caller: "alice".to_string(),
                longueur: 0,
                largeur: 5,
                x: 0,
                y: 0,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.kind, "invalid_argument");
    }

    #[tokio::test]
    async fn test_deposit_amount_validation() {
        let state = test_state();

        for amount in ["0", "-10", "abc"] {
            let (status, Json(error)) = deposit(State(state.clone()), deposit_request("alice", amount))
                .await
                .unwrap_err();
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error.kind, "invalid_argument");
        }

        let Json(stats) = get_stats(State(state)).await;
        assert_eq!(stats.total_received, "0");
        assert_eq!(stats.depositor_count, 0);
    }

    #[tokio::test]
    async fn test_withdraw_status_codes() {
        let state = test_state();

        deposit(State(state.clone()), deposit_request("alice", "100"))
            .await
            .unwrap();

        let (status, _) = withdraw(
            State(state.clone()),
            Json(WithdrawRequest {
                caller: "alice".to_string(),
                amount: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, Json(error)) = withdraw(
            State(state.clone()),
            Json(WithdrawRequest {
                caller: "recipient".to_string(),
                amount: Some("500".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error.kind, "insufficient_funds");

        let Json(response) = withdraw(
            State(state.clone()),
            Json(WithdrawRequest {
                caller: "recipient".to_string(),
                amount: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.amount, "100");

        let Json(stats) = get_stats(State(state.clone())).await;
        assert_eq!(stats.pool_balance, "0");
        assert_eq!(stats.total_withdrawn, "100");

        // Notification amounts are decimal strings too
        let Json(notifications) = list_notifications(
            State(state),
            Query(NotificationsQuery { since: None }),
        )
        .await;
        let json = serde_json::to_string(&notifications).unwrap();
        assert!(json.contains(r#""amount":"100""#));
        assert!(!json.contains(r#""amount":100"#));
    }

    #[tokio::test]
    async fn test_halted_ledger_is_locked() {
        let state = test_state();

        halt(
            State(state.clone()),
            Json(CallerRequest {
                caller: "owner".to_string(),
            }),
        )
        .await
        .unwrap();

        let (status, Json(error)) = deposit(State(state.clone()), deposit_request("alice", "5"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::LOCKED);
        assert_eq!(error.kind, "halted");

        let Json(notifications) = list_notifications(
            State(state),
            Query(NotificationsQuery { since: None }),
        )
        .await;
        assert_eq!(notifications.len(), 1);
    }
}
