use actix_session::Session;
use actix_web::{error, Error};

/// Session key holding the id of the signed-in user.
const USER_ID_KEY: &str = "user_id";

/// Returns the id of the signed-in user, if the session has one.
pub fn get_user_id(session: &Session) -> Option<i32> {
    match session.get::<i32>(USER_ID_KEY) {
        Ok(id) => id,
        Err(e) => {
            log::warn!("get_user_id: unreadable session: {}", e);
            None
        }
    }
}

/// Binds the session to a user. The session id is renewed to avoid fixation.
pub fn login(session: &Session, user_id: i32) -> Result<(), Error> {
    session.renew();
    session
        .insert(USER_ID_KEY, user_id)
        .map_err(error::ErrorInternalServerError)
}

pub fn logout(session: &Session) {
    session.purge();
}
