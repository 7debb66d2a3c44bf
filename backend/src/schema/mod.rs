// Mirrors the DDL in `db::CREATE_PROPERTIES_TABLE`.

diesel::table! {
    properties (id) {
        id -> Integer,
        #[sql_name = "type"]
        property_type -> Text,
        bedrooms -> Integer,
        kitchens -> Integer,
        living_rooms -> Integer,
        toilets -> Integer,
        price -> Double,
        address -> Text,
        status -> Text,
        created_at -> Timestamp,
    }
}
