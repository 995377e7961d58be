//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 document for the ekey webhook bridge.

use ekey_core::{EventParams, FingerEvent, MappingSummary, ResolvedEvent};
use utoipa::OpenApi;

use crate::handlers::{HealthResponse, ReadyResponse};
use crate::sensors::EntityState;

/// ekey bionyx webhook bridge - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ekey Webhook Bridge",
        version = "0.1.0",
        description = r#"
## Fingerprint notifications from ekey bionyx controllers

The controller posts one JSON notification per finger scan. The bridge:

1. checks the optional shared secret (`Authorization: Bearer <token>`)
2. translates user and device ids to names using the installed mapping export
3. fires an `ekey.fingerprint_detected` event on the in-process bus
4. updates three sensors per mapped user: last access, last result, last finger

When a secret token is configured it is required on the notification and
admin routes: a missing header answers `401`, a wrong token `403`. Health,
readiness and these docs stay open.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:9123", description = "Local bridge")
    ),
    tags(
        (name = "Notifications", description = "Webhook receiver for the ekey controller"),
        (name = "Admin", description = "Mapping management and sensor states"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::notification::notification_handler,
        crate::handlers::admin::get_mapping_handler,
        crate::handlers::admin::put_mapping_handler,
        crate::handlers::admin::delete_mapping_handler,
        crate::handlers::admin::list_states_handler,
        crate::handlers::admin::get_state_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            FingerEvent,
            EventParams,
            ResolvedEvent,
            MappingSummary,
            EntityState,
        )
    )
)]
pub struct ApiDoc;
