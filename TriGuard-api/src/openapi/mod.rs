use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Auth endpoints
        crate::api::handlers::authorization::ask_verify_code,
        crate::api::handlers::authorization::ask_phone_code,
        crate::api::handlers::authorization::register,
        crate::api::handlers::authorization::reset_confirm,
        crate::api::handlers::authorization::reset_password,
        crate::api::handlers::authorization::login,
        crate::api::handlers::authorization::logout,

        // Blood pressure endpoints
        crate::api::handlers::blood_pressure::create_record,
        crate::api::handlers::blood_pressure::delete_record,
        crate::api::handlers::blood_pressure::update_record,
        crate::api::handlers::blood_pressure::get_records
    ),
    components(
        schemas(
            crate::entities::common::RestResponseSchema,

            crate::entities::auth::EmailRegisterVO,
            crate::entities::auth::EmailConfirmResetVO,
            crate::entities::auth::EmailResetVO,
            crate::entities::auth::LoginVO,
            crate::entities::auth::AuthorizeVO,

            crate::entities::blood_pressure::BloodPressureVO,
            crate::entities::blood_pressure::BloodPressureCreateVO,
            crate::entities::blood_pressure::BloodPressureUpdateVO,

            crate::api::handlers::health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "auth", description = "Verification codes, registration, password reset and login"),
        (name = "blood_pressure", description = "Blood pressure records of the logged in account")
    ),
    info(
        title = "TriGuard API",
        version = "0.1.0",
        description = "Health tracking backend: accounts and blood pressure records",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by authenticated endpoints
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}
