//! Capability checks and student registration.
//!
//! Identity is established externally (the client carries its uid); this
//! module gates teacher-only surfaces. A request qualifies as teacher when it
//! carries the configured dashboard key, or names a user whose record has the
//! teacher role. Wrong credentials are fatal for the request; the dashboard
//! client reacts by clearing its stored key.

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::docstore::DocStore;
use crate::domain::{Role, UserRecord};
use crate::error::AppError;

/// Registration codes as generated for new classes.
pub fn new_registration_code() -> String {
  const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
  let mut rng = rand::thread_rng();
  (0..6)
    .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
    .collect()
}

/// Teacher gate used by the dashboard, admin and legacy read actions.
pub async fn require_teacher(
  config: &Config,
  store: &DocStore,
  teacher_key: Option<&str>,
  uid: Option<&str>,
) -> Result<(), AppError> {
  if let (Some(expected), Some(provided)) = (config.teacher_key.as_deref(), teacher_key) {
    if expected == provided {
      return Ok(());
    }
    warn!(target: "dashboard", "Invalid teacher key presented");
    return Err(AppError::InvalidTeacherKey);
  }
  if let Some(uid) = uid {
    let users = store.users.read().await;
    if users.get(uid).map(|u| u.role) == Some(Role::Teacher) {
      return Ok(());
    }
  }
  Err(AppError::AccessDenied)
}

/// Self-registration: verify the class code, then create the student record
/// bound to that class.
pub async fn register_student(
  store: &DocStore,
  code: &str,
  display_name: &str,
  email: &str,
) -> Result<(String, String, String), AppError> {
  let code = code.trim().to_uppercase();
  let Some((class_id, class)) = store.class_by_code(&code).await else {
    return Err(AppError::BadRequest("Ungültiger Klassen-Code".into()));
  };

  let uid = Uuid::new_v4().to_string();
  store
    .upsert_user(
      uid.clone(),
      UserRecord {
        display_name: display_name.to_string(),
        email: email.to_string(),
        role: Role::Student,
        class_id: Some(class_id.clone()),
        registered_at: Utc::now(),
      },
    )
    .await;
  info!(target: "dashboard", %uid, class_id = %class_id, "Student registered via class code");
  Ok((uid, class_id, class.class_name))
}
