diesel::table! {
    person (id) {
        id -> BigInt,
        #[max_length = 255]
        model -> Varchar,
    }
}

diesel::table! {
    content (id) {
        id -> BigInt,
        data -> Bytea,
    }
}

diesel::table! {
    document (id) {
        id -> BigInt,
        #[max_length = 255]
        title -> Varchar,
        #[max_length = 255]
        mime_type -> Varchar,
        size -> BigInt,
        person_id -> Nullable<BigInt>,
        content_id -> Nullable<BigInt>,
    }
}

diesel::joinable!(document -> person (person_id));
diesel::joinable!(document -> content (content_id));

diesel::allow_tables_to_appear_in_same_query!(person, document, content);
