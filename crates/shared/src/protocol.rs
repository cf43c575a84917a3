use serde::{Deserialize, Serialize};

use crate::domain::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub company: CompanyPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyPayload {
    pub name: String,
    #[serde(rename = "catchPhrase", default, skip_serializing_if = "Option::is_none")]
    pub catch_phrase: Option<String>,
}

pub fn profile_url(server_url: &str, user_id: UserId) -> String {
    format!("{}/users/{}", server_url.trim_end_matches('/'), user_id.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_directory_document_with_unmodelled_fields() {
        let body = r#"{
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {"street": "Kulas Light", "city": "Gwenborough"},
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "company": {
                "name": "Romaguera-Crona",
                "catchPhrase": "Multi-layered client-server neural-net",
                "bs": "harness real-time e-markets"
            }
        }"#;

        let user: UserPayload = serde_json::from_str(body).expect("payload decodes");
        assert_eq!(user.id, UserId(1));
        assert_eq!(user.name, "Leanne Graham");
        assert_eq!(user.company.name, "Romaguera-Crona");
        assert_eq!(
            user.company.catch_phrase.as_deref(),
            Some("Multi-layered client-server neural-net")
        );
    }

    #[test]
    fn tolerates_missing_catch_phrase() {
        let body = r#"{
            "id": 4,
            "name": "Patricia Lebsack",
            "username": "Karianne",
            "email": "Julianne.OConner@kory.org",
            "phone": "493-170-9623 x156",
            "website": "kale.biz",
            "company": {"name": "Robel-Corkery"}
        }"#;

        let user: UserPayload = serde_json::from_str(body).expect("payload decodes");
        assert!(user.company.catch_phrase.is_none());
    }

    #[test]
    fn builds_profile_urls_without_doubled_slashes() {
        assert_eq!(
            profile_url("https://jsonplaceholder.typicode.com", UserId(3)),
            "https://jsonplaceholder.typicode.com/users/3"
        );
        assert_eq!(
            profile_url("http://127.0.0.1:8080/", UserId(10)),
            "http://127.0.0.1:8080/users/10"
        );
    }
}
