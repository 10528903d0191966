use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, response::Html};

use crate::auth::CurrentUser;
use crate::graphql::RequestUser;
use crate::state::AppState;

pub async fn graphql_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let req = req.into_inner().data(RequestUser(user));
    state.schema.execute(req).await.into()
}

pub async fn graphiql() -> Html<String> {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .subscription_endpoint("/graphql/ws")
            .finish(),
    )
}
