//! Catalog ingestion: search the media server for candidates and bind a
//! confirmed candidate to a trigger word.

use actix_web::HttpResponse;
use anyhow::Result;

use crate::catalog_db::{CatalogDb, InsertOutcome};
use crate::jellyfin::MediaDirectory;
use crate::models::{Candidate, MediaKind};

#[derive(Debug)]
pub enum SearchError {
    /// The configured target user does not exist on the media server.
    UserNotFound { username: String },
    /// The media server call failed; the detail is logged where it happens.
    Upstream,
}

impl SearchError {
    /// Convert a search error into an HTTP response.
    pub fn into_response(self) -> HttpResponse {
        match self {
            SearchError::UserNotFound { username } => {
                HttpResponse::NotFound().body(format!("Jellyfin user '{username}' not found."))
            }
            SearchError::Upstream => HttpResponse::InternalServerError()
                .body("Error connecting to Jellyfin. Check the server log for details."),
        }
    }
}

/// Words served by fixed `GET` routes; a tag bound to one would never play.
const RESERVED_TRIGGERS: [&str; 3] = ["health", "sessions", "swagger-ui"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyExists,
    /// The word cannot be reached as a single `GET /{trigger}` path segment.
    Unroutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { id: i64 },
    Rejected(RejectReason),
}

/// Canonical form of a trigger word as stored in the catalog.
pub fn normalize_trigger(word: &str) -> String {
    word.trim().to_lowercase()
}

fn upstream(err: anyhow::Error, what: &str) -> SearchError {
    tracing::error!(error = %format!("{err:#}"), "{what} failed");
    SearchError::Upstream
}

/// Search the target user's library for items of `kind` matching `text`.
///
/// An empty result is a normal outcome.
pub async fn search(
    directory: &dyn MediaDirectory,
    username: &str,
    kind: MediaKind,
    text: &str,
) -> Result<Vec<Candidate>, SearchError> {
    let user_id = directory
        .user_id(username)
        .await
        .map_err(|err| upstream(err, "user lookup"))?
        .ok_or_else(|| {
            tracing::warn!(username, "target user not found");
            SearchError::UserNotFound {
                username: username.to_string(),
            }
        })?;

    let candidates = directory
        .search_items(&user_id, text, kind)
        .await
        .map_err(|err| upstream(err, "item search"))?;
    tracing::info!(kind = %kind, query = text, count = candidates.len(), "search completed");
    Ok(candidates)
}

/// True when `GET /{trigger}` for the normalized word reaches the trigger route.
pub fn is_routable_trigger(trigger: &str) -> bool {
    !trigger.is_empty()
        && !trigger.contains(['/', '?', '#'])
        && !RESERVED_TRIGGERS.contains(&trigger)
}

/// Bind `candidate` to `trigger_word` in the `kind` collection.
///
/// A conflicting trigger word or item id leaves the existing binding untouched
/// and yields [`RejectReason::AlreadyExists`], so repeated submissions are harmless.
/// Words the trigger route cannot serve are refused with [`RejectReason::Unroutable`].
pub fn commit(
    catalog: &CatalogDb,
    kind: MediaKind,
    candidate: &Candidate,
    trigger_word: &str,
) -> Result<CommitOutcome> {
    let trigger = normalize_trigger(trigger_word);
    if !is_routable_trigger(&trigger) {
        tracing::warn!(kind = %kind, trigger = %trigger, "trigger word not reachable by GET");
        return Ok(CommitOutcome::Rejected(RejectReason::Unroutable));
    }
    match catalog.insert(kind, &candidate.display_name, &trigger, &candidate.item_id)? {
        InsertOutcome::Inserted(id) => {
            tracing::info!(kind = %kind, id, trigger = %trigger, item = %candidate.display_name, "binding added");
            Ok(CommitOutcome::Committed { id })
        }
        InsertOutcome::AlreadyExists => {
            tracing::info!(
                kind = %kind,
                trigger = %trigger,
                item_id = %candidate.item_id,
                "trigger or item already bound"
            );
            Ok(CommitOutcome::Rejected(RejectReason::AlreadyExists))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_db::tests::temp_db;
    use crate::resolver::resolve;
    use crate::test_support::FakeDirectory;

    fn inception() -> Candidate {
        Candidate {
            display_name: "Inception (2010)".to_string(),
            item_id: "inc-id".to_string(),
        }
    }

    #[actix_web::test]
    async fn search_scopes_to_target_user_and_kind() {
        let directory = FakeDirectory {
            items: vec![inception()],
            ..FakeDirectory::with_user("kids", "U1")
        };
        let found = search(&directory, "kids", MediaKind::Movie, "Inception").await.unwrap();
        assert_eq!(found, vec![inception()]);
        assert_eq!(
            directory.search_calls(),
            vec![("U1".to_string(), "Inception".to_string(), MediaKind::Movie)]
        );
    }

    #[actix_web::test]
    async fn empty_search_is_not_an_error() {
        let directory = FakeDirectory::with_user("kids", "U1");
        let found = search(&directory, "kids", MediaKind::Movie, "Inception").await.unwrap();
        assert!(found.is_empty());
    }

    #[actix_web::test]
    async fn unknown_user_fails_whole_search() {
        let directory = FakeDirectory::with_user("someone-else", "U2");
        let err = search(&directory, "kids", MediaKind::Album, "Abbey").await.unwrap_err();
        assert!(matches!(err, SearchError::UserNotFound { ref username } if username == "kids"));
        assert!(directory.search_calls().is_empty());
    }

    #[actix_web::test]
    async fn transport_error_becomes_upstream() {
        let directory = FakeDirectory {
            fail_requests: true,
            ..FakeDirectory::default()
        };
        let err = search(&directory, "kids", MediaKind::Album, "Abbey").await.unwrap_err();
        assert!(matches!(err, SearchError::Upstream));
    }

    #[test]
    fn commit_lowercases_and_resolves() {
        let db = temp_db();
        let outcome = commit(&db, MediaKind::Movie, &inception(), "Dream").unwrap();
        let CommitOutcome::Committed { id } = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        let resolved = resolve(&db, "DREAM").unwrap().unwrap();
        assert_eq!(resolved.entry.id, id);
        assert_eq!(resolved.entry.trigger_word, "dream");
        assert_eq!(resolved.kind, MediaKind::Movie);
    }

    #[test]
    fn repeated_commit_is_rejected_not_duplicated() {
        let db = temp_db();
        assert!(matches!(
            commit(&db, MediaKind::Movie, &inception(), "dream").unwrap(),
            CommitOutcome::Committed { .. }
        ));
        assert_eq!(
            commit(&db, MediaKind::Movie, &inception(), "dream").unwrap(),
            CommitOutcome::Rejected(RejectReason::AlreadyExists)
        );
        assert_eq!(db.count(MediaKind::Movie).unwrap(), 1);
    }

    #[test]
    fn route_names_and_slashes_are_not_bindable() {
        let db = temp_db();
        for word in ["health", "Sessions", " swagger-ui ", "a/b", "what?", "x#y"] {
            assert_eq!(
                commit(&db, MediaKind::Movie, &inception(), word).unwrap(),
                CommitOutcome::Rejected(RejectReason::Unroutable),
                "{word}"
            );
        }
        assert_eq!(db.count(MediaKind::Movie).unwrap(), 0);
        assert!(is_routable_trigger("healthy"));
    }

    #[test]
    fn concurrent_double_commit_binds_once() {
        let db = temp_db();
        let outcomes: Vec<CommitOutcome> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(|| commit(&db, MediaKind::Movie, &inception(), "dup").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let committed = outcomes
            .iter()
            .filter(|o| matches!(o, CommitOutcome::Committed { .. }))
            .count();
        assert_eq!(committed, 1);
        assert!(outcomes.contains(&CommitOutcome::Rejected(RejectReason::AlreadyExists)));
        assert_eq!(db.list(MediaKind::Movie).unwrap().len(), 1);
    }
}
