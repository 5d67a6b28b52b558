//! Diesel table definitions. Keep in sync with `backend/migrations`.

diesel::table! {
    /// System users.
    sys_user (id) {
        #[max_length = 32]
        id -> Varchar,
        #[max_length = 20]
        username -> Varchar,
        #[max_length = 20]
        create_user -> Varchar,
        #[max_length = 20]
        update_user -> Varchar,
        create_time -> Timestamp,
        update_time -> Timestamp,
    }
}
