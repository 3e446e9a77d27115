//! Route paths.

pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_LOGIN_CREDENTIALS: &str = "/auth/login/credentials";
pub const POST_AUTH_LOGIN_FEDERATED: &str = "/auth/login/federated";
pub const GET_AUTH_SESSION: &str = "/auth/session";
pub const POST_AUTH_SESSION_REFRESH: &str = "/auth/session/refresh";
pub const POST_AUTH_LOGOUT: &str = "/auth/logout";
pub const PUT_AUTH_PROFILE: &str = "/auth/profile";

pub const PATCH_ADMIN_USERS_ID: &str = "/admin/users/{id}";

pub const SHEETS: &str = "/sheets";
pub const SHEETS_ID: &str = "/sheets/{id}";
pub const POST_SHEETS_ID_DUPLICATE: &str = "/sheets/{id}/duplicate";
pub const PATCH_SHEETS_ID_PROBLEMS_PROBLEM_ID: &str = "/sheets/{id}/problems/{problem_id}";

pub const TEMPLATES: &str = "/templates";
pub const GET_TEMPLATES_SEARCH: &str = "/templates/search";
pub const GET_TEMPLATES_CATEGORIES: &str = "/templates/categories";
pub const GET_TEMPLATES_MINE: &str = "/templates/mine";
pub const TEMPLATES_ID: &str = "/templates/{id}";
pub const PATCH_TEMPLATES_ID_PROBLEMS: &str = "/templates/{id}/problems";
pub const DELETE_TEMPLATES_ID_PROBLEMS_PROBLEM_ID: &str = "/templates/{id}/problems/{problem_id}";
pub const POST_TEMPLATES_ID_CREATE_SHEET: &str = "/templates/{id}/create-sheet";

pub const PROBLEMS: &str = "/problems";
pub const PROBLEMS_ID: &str = "/problems/{id}";
