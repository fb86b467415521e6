use docqa_document_store::StoreError;
use docqa_protocol::{ErrorCode, ErrorEnvelope};
use docqa_retrieval::RetrievalError;
use docqa_vector_store::VectorStoreError;
use serde_json::json;

/// Maps the first typed error in the chain to a stable envelope.
pub fn classify_error(err: &anyhow::Error) -> ErrorEnvelope {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<RetrievalError>() {
            return from_retrieval(e);
        }
        if let Some(e) = cause.downcast_ref::<StoreError>() {
            return from_store(e);
        }
        if let Some(e) = cause.downcast_ref::<VectorStoreError>() {
            return from_vector_store(e);
        }
    }
    ErrorEnvelope::new(ErrorCode::Internal, format!("{err:#}"))
}

fn from_retrieval(err: &RetrievalError) -> ErrorEnvelope {
    let message = err.to_string();
    match err {
        RetrievalError::EmptyContent => ErrorEnvelope::new(ErrorCode::EmptyContent, message),
        RetrievalError::EmptyQuery => ErrorEnvelope::new(ErrorCode::EmptyQuery, message),
        RetrievalError::InvalidK { k, max } => ErrorEnvelope::new(ErrorCode::InvalidK, message)
            .with_details(json!({ "k": k, "max": max })),
        RetrievalError::UnsupportedFile { expected, .. } => {
            ErrorEnvelope::new(ErrorCode::UnsupportedFile, message)
                .with_hint(format!("Only files ending in {expected} are ingested"))
        }
        RetrievalError::InvalidUtf8 { .. } => ErrorEnvelope::new(ErrorCode::InvalidUtf8, message)
            .with_hint("Re-encode the file as UTF-8"),
        RetrievalError::Embedding(_) => ErrorEnvelope::new(ErrorCode::DependencyFailure, message),
        RetrievalError::Store(inner) => from_store(inner),
        RetrievalError::InvalidConfig(_) => ErrorEnvelope::new(ErrorCode::InvalidConfig, message),
        RetrievalError::Read { .. } | RetrievalError::Other(_) => {
            ErrorEnvelope::new(ErrorCode::Internal, message)
        }
    }
}

fn from_store(err: &StoreError) -> ErrorEnvelope {
    let message = err.to_string();
    match err {
        StoreError::EmptyContent => ErrorEnvelope::new(ErrorCode::EmptyContent, message),
        StoreError::InvalidK(k) => {
            ErrorEnvelope::new(ErrorCode::InvalidK, message).with_details(json!({ "k": k }))
        }
        StoreError::Locked { .. } => ErrorEnvelope::new(ErrorCode::StoreLocked, message)
            .with_hint("Another docqa process holds this data directory; use a different --data-dir"),
        StoreError::Embedding(_)
        | StoreError::Index(_)
        | StoreError::Metadata { .. }
        | StoreError::Io(_)
        | StoreError::Serialization(_) => ErrorEnvelope::new(ErrorCode::DependencyFailure, message),
        StoreError::InvalidConfig(_) => ErrorEnvelope::new(ErrorCode::InvalidConfig, message),
        StoreError::Inconsistent(_) | StoreError::Other(_) => {
            ErrorEnvelope::new(ErrorCode::Internal, message)
        }
    }
}

fn from_vector_store(err: &VectorStoreError) -> ErrorEnvelope {
    let code = match err {
        VectorStoreError::UnsupportedIndexKind(_) => ErrorCode::InvalidConfig,
        _ => ErrorCode::DependencyFailure,
    };
    ErrorEnvelope::new(code, err.to_string())
}
