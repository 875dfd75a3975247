//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, loans, overdues, payments, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ShelfMaster API",
        version = "1.0.0",
        description = "Library loan and penalty lifecycle REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "ShelfMaster Team", email = "contact@shelfmaster.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::list_loans,
        loans::get_loan,
        loans::issue_loans,
        loans::return_loan,
        loans::renew_loan,
        loans::mark_lost,
        loans::mark_damaged,
        loans::settle_payment,
        loans::return_and_pay,
        // Overdues
        overdues::list_overdues,
        overdues::send_reminder,
        // Payments
        payments::list_payments,
        // Stats
        stats::get_lending_stats,
    ),
    components(
        schemas(
            // Loans
            loans::IssueLoansRequest,
            loans::IssueResponse,
            loans::LoanActionResponse,
            loans::MarkLostRequest,
            loans::SettlePaymentRequest,
            loans::PaymentResponse,
            crate::models::loan::LoanDetails,
            crate::models::loan::IssuedCopy,
            crate::models::loan::IssueOutcome,
            crate::models::penalty::Penalty,
            crate::models::penalty::Payment,
            crate::models::penalty::PaymentEntry,
            crate::models::enums::LoanStatus,
            crate::models::enums::CopyStatus,
            crate::models::enums::PenaltyReason,
            // Overdues
            crate::models::overdue::Overdue,
            crate::models::overdue::OverdueDetails,
            overdues::ReminderResponse,
            // Stats
            stats::LendingStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Loan ledger operations"),
        (name = "overdues", description = "Overdue tracking and reminders"),
        (name = "payments", description = "Penalty settlement ledger"),
        (name = "stats", description = "Lending statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
