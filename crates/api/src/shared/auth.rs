use actix_web::HttpRequest;

/// Identity forwarded by the authenticating reverse proxy.
#[derive(Debug, Clone, Default)]
pub struct RemoteIdentity {
    pub user_id: Option<String>,
    pub roles: Vec<String>,
}

/// Reads `X-Remote-User-ID` and the multi-valued `X-Remote-Role` headers.
pub fn remote_identity(req: &HttpRequest) -> RemoteIdentity {
    let user_id = req
        .headers()
        .get("X-Remote-User-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string());

    let roles = req
        .headers()
        .get_all("X-Remote-Role")
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .collect();

    RemoteIdentity { user_id, roles }
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_identity_headers() {
        let req = TestRequest::default()
            .insert_header(("X-Remote-User-ID", "u-1"))
            .append_header(("X-Remote-Role", "vet"))
            .append_header(("X-Remote-Role", "admin"))
            .to_http_request();

        let identity = remote_identity(&req);
        assert_eq!(identity.user_id.as_deref(), Some("u-1"));
        assert_eq!(identity.roles, vec!["vet", "admin"]);
    }

    #[test]
    fn missing_headers_yield_an_anonymous_identity() {
        let req = TestRequest::default().to_http_request();
        let identity = remote_identity(&req);
        assert_eq!(identity.user_id, None);
        assert!(identity.roles.is_empty());
    }
}
