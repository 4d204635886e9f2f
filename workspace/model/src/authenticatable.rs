/// Capability implemented by records that can be logged in.
///
/// The session layer only ever stores [`Authenticatable::identity`] in the
/// client cookie, and resolves it back into a record on every request.
pub trait Authenticatable {
    /// Stable, opaque identifier written into the session.
    fn identity(&self) -> String;

    /// A loaded record always represents an authenticated caller.
    fn is_authenticated(&self) -> bool {
        true
    }

    /// Whether the record may log in at all.
    fn is_active(&self) -> bool {
        true
    }
}
