use domain_documents::DocumentApiDoc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Documents API",
        version = "0.1.0",
        description = "Document ingestion and similarity retrieval over a vector store"
    ),
    nest(
        (path = "/api/documents", api = DocumentApiDoc)
    )
)]
pub struct ApiDoc;
