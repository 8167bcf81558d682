use std::sync::Arc;

use crate::api::ConcernApi;
use crate::error::ApiError;
use crate::state::data::{Comment, Concern, ConcernId, NewConcern, Role};
use crate::state::mutators::{MutationReply, MutationRequest};
use crate::state::resolver::{Query, QueryPayload};
use crate::state::store::Generation;

/// Backend work the dashboard wants done.
///
/// Actions return a `Request` instead of calling the backend themselves;
/// the caller runs it and feeds the `Response` back into `Dashboard::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Query { generation: Generation, query: Query },
    Mutation(MutationRequest),
    Comments(ConcernId),
    Upload(NewConcern),
    Marquee(Role),
}

/// The continuation of a `Request`
#[derive(Debug, Clone)]
pub enum Response {
    Query {
        generation: Generation,
        query: Query,
        result: Result<QueryPayload, ApiError>,
    },
    Mutation {
        request: MutationRequest,
        result: Result<MutationReply, ApiError>,
    },
    Comments {
        concern: ConcernId,
        result: Result<Vec<Comment>, ApiError>,
    },
    Upload(Result<Concern, ApiError>),
    Marquee(Result<String, ApiError>),
}

impl Request {
    /// Run the request; owns its inputs so the future can be spawned
    pub async fn execute(self, api: Arc<dyn ConcernApi>) -> Response {
        match self {
            Request::Query { generation, query } => {
                let result = query.fetch(api.as_ref()).await;
                Response::Query {
                    generation,
                    query,
                    result,
                }
            }
            Request::Mutation(request) => {
                let result = request.send(api.as_ref()).await;
                Response::Mutation { request, result }
            }
            Request::Comments(concern) => Response::Comments {
                concern,
                result: api.fetch_comments(concern).await,
            },
            Request::Upload(concern) => Response::Upload(api.upload(&concern).await),
            Request::Marquee(role) => Response::Marquee(api.marquee(role).await),
        }
    }
}
