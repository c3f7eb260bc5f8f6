// e-Sword .bblx schema. Table and column names are capitalized in the
// files e-Sword ships, hence the sql_name attributes. The Details and
// Books tables are optional; readers tolerate their absence.

diesel::table! {
    #[sql_name = "Bible"]
    bible (book, chapter, verse) {
        #[sql_name = "Book"]
        book -> Integer,
        #[sql_name = "Chapter"]
        chapter -> Integer,
        #[sql_name = "Verse"]
        verse -> Integer,
        #[sql_name = "Scripture"]
        scripture -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "Books"]
    books (book) {
        #[sql_name = "Book"]
        book -> Integer,
        #[sql_name = "Short"]
        short -> Nullable<Text>,
        #[sql_name = "Long"]
        long -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "Details"]
    details (description) {
        #[sql_name = "Description"]
        description -> Nullable<Text>,
        #[sql_name = "Abbreviation"]
        abbreviation -> Nullable<Text>,
        #[sql_name = "Information"]
        information -> Nullable<Text>,
        #[sql_name = "Version"]
        version -> Nullable<Text>,
        #[sql_name = "Font"]
        font -> Nullable<Text>,
        #[sql_name = "RightToLeft"]
        right_to_left -> Nullable<Bool>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(bible, books, details);
