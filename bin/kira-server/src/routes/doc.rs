use kira_web::health::HealthApi;
use utoipa::OpenApi;

use crate::routes::kira::KiraApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "kira-server",
    description = "Kira chat-reply API",
    contact(name = "kira", url = "https://github.com/kira-ai/kira.rs")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(HealthApi::openapi());
    root.merge(KiraApi::openapi());
    root
}
