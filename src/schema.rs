table! {
    notes (id) {
        id -> Int4,
        content -> Text,
        timestamp -> Timestamp,
        server_name -> Varchar,
    }
}
