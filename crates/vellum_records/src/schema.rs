//! Diesel schema for the metadata table.

diesel::table! {
    /// One row per record; asset references live inside `fields`.
    asset_records (id) {
        id -> Text,
        owner_id -> Text,
        version -> Int8,
        fields -> Jsonb,
        updated_at -> Timestamptz,
    }
}
