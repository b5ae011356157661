//! Session IPC commands: tenant directory, login, logout, remember-me.

use std::sync::Arc;

use tauri::State;

use crate::api::types::LoginRequest;
use crate::config;
use crate::core_state::CoreState;
use crate::models::ClinicEntity;
use crate::session::StoredCredentials;

/// Tenant directory for the login screen picker.
#[tauri::command]
pub async fn fetch_subdomains(
    state: State<'_, Arc<CoreState>>,
) -> Result<Vec<ClinicEntity>, String> {
    state
        .write(&state.session)
        .map_err(|e| e.to_string())?
        .begin();

    match state.api().fetch_subdomains().await {
        Ok(subdomains) => {
            let mut session = state.write(&state.session).map_err(|e| e.to_string())?;
            session.loading = false;
            session.error = None;
            session.data.subdomains = subdomains.clone();
            Ok(subdomains)
        }
        Err(e) => {
            let message = e.to_string();
            let mut session = state.write(&state.session).map_err(|e| e.to_string())?;
            session.fail(message.clone());
            session.data.subdomains.clear();
            Err(message)
        }
    }
}

/// Log in to a clinic tenant. On success the bearer token is persisted
/// and, when the user opted in, the credentials are remembered for the
/// configured window.
#[tauri::command]
pub async fn login_clinic(
    subdomain: String,
    username: String,
    password: String,
    pin: String,
    remember: bool,
    state: State<'_, Arc<CoreState>>,
) -> Result<(), String> {
    if subdomain.trim().is_empty() || username.trim().is_empty() {
        return Err("Clinic and username are required".into());
    }

    state
        .write(&state.session)
        .map_err(|e| e.to_string())?
        .begin();

    let request = LoginRequest {
        subdomain: subdomain.clone(),
        username: username.clone(),
        password: password.clone(),
        pin: pin.clone(),
    };
    match state.api().login(&request).await {
        Ok(token) => {
            state.store().set_token(&token).map_err(|e| e.to_string())?;
            if remember {
                state
                    .store()
                    .remember_credentials(
                        StoredCredentials {
                            subdomain: subdomain.clone(),
                            username,
                            password,
                            pin,
                        },
                        config::REMEMBER_ME_DAYS,
                    )
                    .map_err(|e| e.to_string())?;
            }

            let mut session = state.write(&state.session).map_err(|e| e.to_string())?;
            session.loading = false;
            session.error = None;
            session.data.authenticated = true;
            session.data.subdomain = Some(subdomain);
            tracing::info!("Logged in to clinic tenant");
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            state
                .write(&state.session)
                .map_err(|e| e.to_string())?
                .fail(message.clone());
            Err(message)
        }
    }
}

/// Log out: delete the token and remembered credentials, reset every
/// slice, and cancel any pending debounced searches.
#[tauri::command]
pub fn logout(state: State<'_, Arc<CoreState>>) -> Result<(), String> {
    state.store().clear_all().map_err(|e| e.to_string())?;
    state.patient_search.cancel();
    state.catalog_search.cancel();

    *state.write(&state.session).map_err(|e| e.to_string())? = Default::default();
    *state.write(&state.clinic).map_err(|e| e.to_string())? = Default::default();
    *state.write(&state.patients).map_err(|e| e.to_string())? = Default::default();
    *state.write(&state.appointments).map_err(|e| e.to_string())? = Default::default();
    *state.write(&state.assessment).map_err(|e| e.to_string())? = Default::default();
    *state.write(&state.prescription).map_err(|e| e.to_string())? = Default::default();

    tracing::info!("Logged out, session cleared");
    Ok(())
}

/// Remembered credentials for pre-filling the login form, if present
/// and unexpired.
#[tauri::command]
pub fn remembered_login(
    state: State<'_, Arc<CoreState>>,
) -> Result<Option<StoredCredentials>, String> {
    state
        .store()
        .remembered_credentials()
        .map_err(|e| e.to_string())
}

/// Drop remembered credentials without logging out.
#[tauri::command]
pub fn forget_remembered_login(state: State<'_, Arc<CoreState>>) -> Result<(), String> {
    state.store().forget_credentials().map_err(|e| e.to_string())
}
