const MAILS: &str = "mails";

pub fn collection_path() -> [&'static str; 1] {
    [MAILS]
}

pub fn search_path() -> [&'static str; 2] {
    [MAILS, "search"]
}

pub fn item_path(item_id: &str) -> [&str; 2] {
    [MAILS, item_id]
}

pub fn search_query(key: &str) -> Vec<(String, String)> {
    vec![("keyword".to_string(), key.to_string())]
}
