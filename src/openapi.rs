use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kerani API",
        version = "0.3.0",
        description = r#"
# Kerani HRMS back-office API

Operational engine for multi-tenant HR: time & attendance with per-company
work rules, weekly rostering, sales commission, expense claims with
OCR-assisted approval, leave, salary advances and resignation settlement.

## Authentication

Every endpoint expects a bearer token issued by the login service:

```
Authorization: Bearer <jwt>
```

The token carries the tenant (company) and the caller's roles; all data
access is scoped to that tenant.
        "#,
        contact(name = "Kerani Systems", email = "engineering@kerani.my"),
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "Attendance", description = "Clock records, approvals, overtime"),
        (name = "Schedules", description = "Rosters and shift templates"),
        (name = "Commission", description = "Sales periods and payouts"),
        (name = "Claims", description = "Expense claims and receipts"),
        (name = "Resignations", description = "Exit lifecycle and settlement"),
        (name = "Admin", description = "Retention, driver sync, job triggers")
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::ListQuery,
            crate::errors::ErrorResponse,
            crate::handlers::common::MessageResponse,
            crate::handlers::common::BulkOutcome,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Kerani API"));
    }
}
