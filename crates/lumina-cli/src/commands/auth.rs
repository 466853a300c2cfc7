use std::io::{self, IsTerminal};

use crate::cli::LoginArgs;
use crate::client::{AppContext, CliError, CliResult};

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let password = resolve_password(&args)?;
    let credential = ctx
        .api
        .login(&args.username, &password)
        .await
        .map_err(CliError::from_api)?;
    println!("Logged in as {}", credential.username);
    Ok(())
}

pub(crate) fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    if ctx.api.credentials().is_authenticated() {
        ctx.api.logout();
        println!("Logged out");
    } else {
        println!("No stored credential; nothing to do");
    }
    Ok(())
}

fn resolve_password(args: &LoginArgs) -> CliResult<String> {
    if let Some(value) = &args.password {
        if value.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        return Ok(value.clone());
    }

    if io::stdin().is_terminal() {
        let password = rpassword::prompt_password("Password: ")
            .map_err(|err| CliError::failure(anyhow::anyhow!("failed to read password: {err}")))?;
        if password.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        Ok(password)
    } else {
        Err(CliError::validation(
            "password required; supply via --password when running non-interactively",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use lumina_client::{ApiClient, CredentialStore};

    fn context_with_store(server: &MockServer, store: CredentialStore) -> AppContext {
        let api = ApiClient::new(server.base_url().parse().expect("valid URL"), store)
            .expect("client should build");
        AppContext { api }
    }

    #[tokio::test]
    async fn login_probes_health_and_persists_credential() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/health")
                .header("authorization", "Basic YWxpY2U6c2VjcmV0");
            then.status(200).body("OK");
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        let store = CredentialStore::open(Some(path.clone()));
        let ctx = context_with_store(&server, store.clone());

        handle_login(
            &ctx,
            LoginArgs {
                username: "alice".to_string(),
                password: Some("secret".to_string()),
            },
        )
        .await
        .expect("login should succeed");

        assert!(store.is_authenticated());
        assert!(path.is_file());
        mock.assert();
    }

    #[tokio::test]
    async fn logout_clears_stored_credential() {
        let server = MockServer::start_async().await;
        let store = CredentialStore::in_memory();
        store.install(lumina_client::Credential::encode("alice", "secret"));
        let ctx = context_with_store(&server, store.clone());

        handle_logout(&ctx).expect("logout should succeed");
        assert!(!store.is_authenticated());
    }

    #[test]
    fn empty_password_flag_is_rejected() {
        let err = resolve_password(&LoginArgs {
            username: "alice".to_string(),
            password: Some(String::new()),
        })
        .expect_err("empty password should fail");
        assert!(matches!(err, CliError::Validation(message) if message.contains("empty")));
    }
}
