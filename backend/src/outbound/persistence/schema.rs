//! Diesel table definitions for the helpdesk schema.
//!
//! Must match `backend/migrations` exactly. Tickets point at `users` twice
//! (requester and assignee), so no `joinable!` is declared; adapters hydrate
//! references with separate `eq_any` queries instead.

diesel::table! {
    /// Directory users.
    users (id) {
        id -> Uuid,
        /// Display name (max 120 characters).
        name -> Varchar,
        /// Lower-cased, unique.
        email -> Varchar,
        active -> Bool,
        photo_url -> Nullable<Text>,
        /// Argon2id PHC string; absent for users created through tickets.
        password_hash -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Lookup catalogue, unique per `(category, description)`.
    lookup_entries (id) {
        id -> Uuid,
        category -> Varchar,
        description -> Varchar,
    }
}

diesel::table! {
    /// Support tickets.
    tickets (id) {
        id -> Uuid,
        problem_description -> Text,
        priority_id -> Uuid,
        type_id -> Uuid,
        environment_id -> Uuid,
        origin_id -> Uuid,
        status_id -> Uuid,
        requester_id -> Uuid,
        assignee_id -> Nullable<Uuid>,
        evidence -> Text,
        attachments -> Nullable<Text>,
        resolution_details -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        /// Set on entering "In Progress".
        handling_started_at -> Nullable<Timestamptz>,
        /// Set on entering "Resolved".
        handling_ended_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(lookup_entries, tickets, users);
