// Kept in sync with `store::postgres::SCHEMA`.

diesel::table! {
    guests (id) {
        id -> Int4,
        child_name -> Text,
        parent_name -> Text,
        contact_email -> Nullable<Text>,
        whatsapp -> Text,
        token -> Text,
        status -> Text,
        created_at -> Timestamptz,
        responded_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    admin_users (id) {
        id -> Int4,
        email -> Text,
        password_hash -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(guests, admin_users);
