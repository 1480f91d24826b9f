use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .merge(duel_routes())
        .merge(question_routes())
        .merge(submission_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::auth::*;

    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(me))
}

fn duel_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::duel::*;

    OpenApiRouter::new()
        .routes(routes!(create_duel))
        .routes(routes!(list_public_duels))
        .routes(routes!(list_my_duels))
        .routes(routes!(get_my_stats))
        .routes(routes!(get_duel))
        .routes(routes!(join_duel))
        .routes(routes!(submit_solution))
        .routes(routes!(cancel_duel))
        .routes(routes!(get_duel_by_invite, join_duel_by_invite))
}

fn question_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::question::*;

    OpenApiRouter::new()
        .routes(routes!(list_questions, create_question))
        .routes(routes!(get_question))
}

fn submission_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::submission::*;

    OpenApiRouter::new()
        .routes(routes!(list_submissions, create_submission))
        .routes(routes!(get_submission))
}
