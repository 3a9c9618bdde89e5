use std::fmt;

/// Slash separated path of a collection, e.g. `users` or `users/u1/attendance`.
/// Always has an odd number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

/// Path of a single document: its parent collection plus the document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl CollectionPath {
    /// Top-level collection.
    pub fn root(id: &str) -> Self {
        CollectionPath(id.to_string())
    }

    pub fn doc(&self, id: &str) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: id.to_string(),
        }
    }

    /// Last segment.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Document this collection hangs off, `None` for top-level collections.
    pub fn parent(&self) -> Option<DocPath> {
        let (parent, _) = self.0.rsplit_once('/')?;
        DocPath::parse(parent)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl DocPath {
    /// Parses `a/b` or `a/b/c/d`. Rejects odd segment counts and empty segments.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim_matches('/');
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 2 || segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty())
        {
            return None;
        }
        let (collection, id) = path.rsplit_once('/')?;
        Some(DocPath {
            collection: CollectionPath(collection.to_string()),
            id: id.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    /// Subcollection under this document.
    pub fn collection(&self, id: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{}", self.collection.0, self.id, id))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.collection.segments().chain(std::iter::once(self.id.as_str()))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Returns the collection directly under `parent` (or at the root when `parent` is
/// `None`) that contains `doc`, if `doc` lives anywhere below it.
///
/// A collection counts as present as soon as any descendant document exists, even if
/// the intermediate documents do not.
pub fn child_collection_of(parent: Option<&DocPath>, doc: &DocPath) -> Option<CollectionPath> {
    let doc_segments: Vec<&str> = doc.segments().collect();
    let prefix: Vec<&str> = parent.map(|p| p.segments().collect()).unwrap_or_default();

    if doc_segments.len() <= prefix.len() + 1 || !doc_segments.starts_with(&prefix) {
        return None;
    }

    let mut path = prefix.join("/");
    if !path.is_empty() {
        path.push('/');
    }
    path.push_str(doc_segments[prefix.len()]);
    Some(CollectionPath(path))
}

/// Matches `users/{userId}/leave_requests/{requestId}` and returns the two ids.
pub fn match_leave_request(path: &DocPath) -> Option<(String, String)> {
    let segments: Vec<&str> = path.segments().collect();
    match segments.as_slice() {
        ["users", user_id, "leave_requests", request_id] => {
            Some((user_id.to_string(), request_id.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_document_paths() {
        let path = DocPath::parse("users/u1/attendance/a1").unwrap();
        assert_eq!(path.id(), "a1");
        assert_eq!(path.parent().as_str(), "users/u1/attendance");
        assert_eq!(path.parent().id(), "attendance");
        assert_eq!(path.parent().parent().unwrap().to_string(), "users/u1");
        assert_eq!(path.to_string(), "users/u1/attendance/a1");
    }

    #[test]
    fn rejects_collection_paths_and_empty_segments() {
        assert!(DocPath::parse("users").is_none());
        assert!(DocPath::parse("users/u1/profile").is_none());
        assert!(DocPath::parse("users//profile/p").is_none());
        assert!(DocPath::parse("").is_none());
    }

    #[test]
    fn finds_child_collections() {
        let deep = DocPath::parse("users/u1/profile/u1").unwrap();
        let user = DocPath::parse("users/u1").unwrap();

        assert_eq!(child_collection_of(None, &deep).unwrap().as_str(), "users");
        assert_eq!(
            child_collection_of(Some(&user), &deep).unwrap().as_str(),
            "users/u1/profile"
        );
        // a document is not its own child
        assert!(child_collection_of(Some(&user), &user).is_none());

        let other = DocPath::parse("users/u2").unwrap();
        assert!(child_collection_of(Some(&other), &deep).is_none());
    }

    #[test]
    fn matches_leave_request_documents_only() {
        let leave = DocPath::parse("users/u1/leave_requests/r9").unwrap();
        assert_eq!(
            match_leave_request(&leave),
            Some(("u1".to_string(), "r9".to_string()))
        );

        let attendance = DocPath::parse("users/u1/attendance/r9").unwrap();
        assert_eq!(match_leave_request(&attendance), None);
    }
}
