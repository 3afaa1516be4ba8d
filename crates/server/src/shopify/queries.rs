//! GraphQL operations against the Shopify Admin API.
//!
//! Uses `graphql_client` to generate typed variables and responses from the
//! `.graphql` documents under `graphql/admin/`.

use graphql_client::GraphQLQuery;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/themes.graphql",
    response_derives = "Debug, Clone"
)]
pub struct ThemeDuplicate;
