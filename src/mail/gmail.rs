//! Gmail over IMAP. Labels are read and written through the `X-GM-LABELS`
//! extension; every message is addressed by its UID in the `\All` mailbox and
//! stands in for its thread.

use std::net::TcpStream;
use std::sync::{Mutex, PoisonError};

use base64::{Engine as _, engine::general_purpose};
use imap::types::NameAttribute;
use log::{debug, warn};
use native_tls::{TlsConnector, TlsStream};

use crate::auth::token_manager::TokenManager;
use crate::domain::label::{LabelHandle, ThreadHandle};
use crate::mail::mailbox::{Mailbox, MailboxError, MailboxResult};

type ImapSession = imap::Session<TlsStream<TcpStream>>;

const ALL_MAIL_FALLBACK: &str = "[Gmail]/All Mail";

/// Build canonical auth string as bytes.
fn build_xoauth2_bytes(user: &str, access_token: &str) -> Vec<u8> {
    format!("user={user}\x01auth=Bearer {access_token}\x01\x01").into_bytes()
}

struct OAuth2Authenticator {
    response: Vec<u8>,
}

impl imap::Authenticator for OAuth2Authenticator {
    type Response = Vec<u8>;
    fn process(&self, _challenge: &[u8]) -> Self::Response {
        self.response.clone()
    }
}

/// Quotes `s` as an IMAP string.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn uid_set(threads: &[ThreadHandle]) -> String {
    threads
        .iter()
        .map(|t| t.id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub struct GmailMailbox {
    server: String,
    user: String,
    tokens: TokenManager,
    session: Mutex<Option<ImapSession>>,
}

impl GmailMailbox {
    pub fn new(server: impl Into<String>, user: impl Into<String>, tokens: TokenManager) -> Self {
        Self {
            server: server.into(),
            user: user.into(),
            tokens,
            session: Mutex::new(None),
        }
    }

    fn connect_and_auth(&self) -> MailboxResult<ImapSession> {
        let access_token = self
            .tokens
            .get_access_token()
            .map_err(|e| MailboxError::Unavailable(format!("access token: {e}")))?;

        let tls = TlsConnector::builder().build()?;
        let mut client = imap::connect((self.server.as_str(), 993), self.server.as_str(), &tls)?;

        let raw_payload = build_xoauth2_bytes(&self.user, &access_token);

        // Try RAW first
        let auth_raw = OAuth2Authenticator {
            response: raw_payload.clone(),
        };
        match client.authenticate("XOAUTH2", &auth_raw) {
            Ok(session) => return Ok(session),
            Err((e, returned_client)) => {
                debug!("XOAUTH2 with raw payload failed: {e}");
                client = returned_client;
            }
        }

        // Fallback BASE64
        let auth_b64 = OAuth2Authenticator {
            response: general_purpose::STANDARD.encode(&raw_payload).into_bytes(),
        };
        client
            .authenticate("XOAUTH2", &auth_b64)
            .map_err(|(e, _)| MailboxError::Unavailable(format!("XOAUTH2 failed (raw+base64): {e}")))
    }

    fn open_session(&self) -> MailboxResult<ImapSession> {
        let mut session = self.connect_and_auth()?;
        let all_mail = find_all_mail(&mut session)?;
        session.select(&all_mail)?;
        debug!("selected {all_mail} on {}", self.server);
        Ok(session)
    }

    /// Runs `f` on the shared session, connecting first if needed. A failed
    /// call drops the session so the next one reconnects.
    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut ImapSession) -> imap::error::Result<T>,
    ) -> MailboxResult<T> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(self.open_session()?);
        }
        let session = guard
            .as_mut()
            .ok_or_else(|| MailboxError::Unavailable("no IMAP session".to_string()))?;

        match f(session) {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!("IMAP call failed, dropping session: {e}");
                *guard = None;
                Err(e.into())
            }
        }
    }

    fn store(&self, threads: &[ThreadHandle], query: &str) -> MailboxResult<()> {
        if threads.is_empty() {
            return Ok(());
        }
        let set = uid_set(threads);
        self.with_session(|s| s.uid_store(&set, query).map(|_| ()))
    }

    fn label_exists(&self, name: &str) -> MailboxResult<bool> {
        let pattern = quote(name);
        self.with_session(|s| {
            let names = s.list(Some(""), Some(pattern.as_str()))?;
            Ok(names.iter().any(|n| n.name() == name))
        })
    }
}

fn find_all_mail(session: &mut ImapSession) -> MailboxResult<String> {
    let names = session.list(Some(""), Some("*"))?;
    let found = names
        .iter()
        .find(|n| {
            n.attributes()
                .iter()
                .any(|a| matches!(a, NameAttribute::Custom(c) if c.eq_ignore_ascii_case("\\All")))
        })
        .map(|n| n.name().to_string());
    Ok(found.unwrap_or_else(|| ALL_MAIL_FALLBACK.to_string()))
}

impl Mailbox for GmailMailbox {
    fn get_label(&self, name: &str) -> MailboxResult<LabelHandle> {
        if self.label_exists(name)? {
            Ok(LabelHandle::new(name))
        } else {
            Err(MailboxError::LabelNotFound(name.to_string()))
        }
    }

    fn threads_for_label(
        &self,
        label: &LabelHandle,
        offset: usize,
        limit: usize,
    ) -> MailboxResult<Vec<ThreadHandle>> {
        let query = format!("X-GM-LABELS {}", quote(&label.name));
        let mut uids: Vec<u32> = self
            .with_session(|s| s.uid_search(&query))?
            .into_iter()
            .collect();
        uids.sort_unstable();

        Ok(uids
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(ThreadHandle::new)
            .collect())
    }

    fn move_to_inbox(&self, threads: &[ThreadHandle]) -> MailboxResult<()> {
        self.store(threads, "+X-GM-LABELS (\\Inbox)")
    }

    fn move_to_archive(&self, threads: &[ThreadHandle]) -> MailboxResult<()> {
        self.store(threads, "-X-GM-LABELS (\\Inbox)")
    }

    fn mark_read(&self, threads: &[ThreadHandle]) -> MailboxResult<()> {
        self.store(threads, "+FLAGS.SILENT (\\Seen)")
    }

    fn mark_unread(&self, threads: &[ThreadHandle]) -> MailboxResult<()> {
        self.store(threads, "-FLAGS.SILENT (\\Seen)")
    }

    fn remove_label(&self, label: &LabelHandle, threads: &[ThreadHandle]) -> MailboxResult<()> {
        self.store(threads, &format!("-X-GM-LABELS ({})", quote(&label.name)))
    }

    fn create_label(&self, name: &str) -> MailboxResult<bool> {
        if self.label_exists(name)? {
            return Ok(false);
        }
        self.with_session(|s| s.create(name))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xoauth2_payload_layout() {
        assert_eq!(
            b"user=me@example.com\x01auth=Bearer tok\x01\x01".to_vec(),
            build_xoauth2_bytes("me@example.com", "tok")
        );
    }

    #[test]
    fn quote_escapes_specials() {
        assert_eq!("\"Remind me/Tomorrow\"", quote("Remind me/Tomorrow"));
        assert_eq!(r#""a\"b\\c""#, quote(r#"a"b\c"#));
    }

    #[test]
    fn uid_set_joins_ids() {
        let threads = [ThreadHandle::new(3), ThreadHandle::new(7), ThreadHandle::new(11)];
        assert_eq!("3,7,11", uid_set(&threads));
    }
}
