use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::server::state::{ModelHolder, ServerState};
use crate::server::ServerError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
}

impl From<&ModelHolder> for ModelCard {
    fn from(holder: &ModelHolder) -> Self {
        Self {
            id: holder.name().to_string(),
            object: "model".to_string(),
            created: holder.created(),
            owned_by: holder.source().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelCardList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

/// `GET /v1/models`
pub async fn list_models(State(server_state): State<Arc<ServerState>>) -> Json<ModelCardList> {
    Json(ModelCardList {
        object: "list".to_string(),
        data: vec![ModelCard::from(&server_state.model)],
    })
}

/// `GET /v1/models/:model_id`
pub async fn get_model(
    State(server_state): State<Arc<ServerState>>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelCard>, ServerError> {
    if model_id != server_state.model.name() {
        return Err(ServerError::ModelNotFound);
    }

    Ok(Json(ModelCard::from(&server_state.model)))
}
