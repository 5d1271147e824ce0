// Access control for file-open requests.
//
// Every open goes through [decide]: the caller presents the inode's
// permission record and the requesting principal, and gets back a
// decision. The check is pure and stateless so the same record,
// principal and mode always produce the same answer.

// ====== TYPES ======

/// One permission triad: read, write, execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rwx {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Rwx {
    pub const fn new(read: bool, write: bool, execute: bool) -> Self {
        Self { read, write, execute }
    }
}

pub const READ: Rwx = Rwx::new(true, false, false);
pub const WRITE: Rwx = Rwx::new(false, true, false);
pub const EXEC: Rwx = Rwx::new(false, false, true);

/// The permission record of one inode: owning user, owning group,
/// and one [Rwx] triad per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perm {
    pub uid: u8,
    pub gid: u8,
    pub owner: Rwx,
    pub group: Rwx,
    pub other: Rwx,
}

/// The identity a request is made under. Carried explicitly with
/// every request; nothing here is read from ambient process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: u8,
    /// Primary group.
    pub gid: u8,
    /// Supplementary groups.
    pub groups: Vec<u8>,
}

impl Principal {
    /// A principal whose primary group id equals its user id
    /// and with no supplementary groups.
    pub fn new(uid: u8) -> Self {
        Self { uid, gid: uid, groups: Vec::new() }
    }

    /// Return a [bool] telling whether `gid` is the principal's
    /// primary group or one of its supplementary groups.
    pub fn in_group(&self, gid: u8) -> bool {
        self.gid == gid || self.groups.contains(&gid)
    }
}

/// Requested access for a file open. Closed set: there is no
/// "open for execute" and no way to request nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn readable(&self) -> bool {
        match self {
            Self::ReadOnly | Self::ReadWrite => true,
            Self::WriteOnly => false,
        }
    }

    pub fn writable(&self) -> bool {
        match self {
            Self::WriteOnly | Self::ReadWrite => true,
            Self::ReadOnly => false,
        }
    }

    /// The exact set of permission bits this mode requires.
    pub fn required(&self) -> Rwx {
        Rwx::new(self.readable(), self.writable(), false)
    }
}

/// Why a request was denied. One canonical code: the caller lacked
/// a required permission bit. Missing files, bad paths and the like
/// are reported elsewhere and never collapse into this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    InsufficientPrivilege,
}

/// The outcome of an access check. An allow carries the mode the
/// descriptor is bound to; later reads and writes are gated by that
/// mode, not re-checked against the inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(AccessMode),
    Deny(Denial),
}

impl Decision {
    pub fn allowed(&self) -> bool {
        match self {
            Self::Allow(_) => true,
            Self::Deny(_) => false,
        }
    }
}

// ====== FN ======

/// Select the triad that applies to `who`.
///
/// Exactly one tier is consulted, in fixed order: the owner triad if
/// `who` is the owning user, else the group triad if the owning group
/// is one of `who`'s groups, else the other triad. A principal that
/// matches an earlier tier never falls through to a later one, even
/// when the later triad would grant more.
pub fn effective(perm: &Perm, who: &Principal) -> Rwx {
    if who.uid == perm.uid {
        return perm.owner;
    }
    if who.in_group(perm.gid) {
        return perm.group;
    }
    perm.other
}

/// Return a [bool] telling whether `who` holds every bit in `need`
/// on an inode with record `perm`. Bits outside `need` are ignored.
pub fn permits(perm: &Perm, who: &Principal, need: Rwx) -> bool {
    covers(effective(perm, who), need)
}

/// Decide a file-open request. Allow exactly when the effective triad
/// contains every bit the mode requires; a read-write open is not
/// satisfiable by read alone or write alone.
pub fn decide(perm: &Perm, who: &Principal, mode: AccessMode) -> Decision {
    if covers(effective(perm, who), mode.required()) {
        Decision::Allow(mode)
    } else {
        Decision::Deny(Denial::InsufficientPrivilege)
    }
}

fn covers(have: Rwx, need: Rwx) -> bool {
    (!need.read || have.read)
        && (!need.write || have.write)
        && (!need.execute || have.execute)
}

// ====== TEST ======

#[cfg(test)]
mod tests {
    use super::*;

    fn triad(bits: u16) -> Rwx {
        Rwx::new(bits & 0o4 > 0, bits & 0o2 > 0, bits & 0o1 > 0)
    }

    fn perm(uid: u8, gid: u8, mode: u16) -> Perm {
        Perm {
            uid,
            gid,
            owner: triad(mode >> 6),
            group: triad(mode >> 3),
            other: triad(mode),
        }
    }

    fn member(uid: u8, gid: u8) -> Principal {
        Principal { uid, gid, groups: Vec::new() }
    }

    #[test]
    fn owner_readonly_on_0444_allows() {
        let p = perm(1, 1, 0o444);
        let who = Principal::new(1);
        assert_eq!(decide(&p, &who, AccessMode::ReadOnly), Decision::Allow(AccessMode::ReadOnly));
    }

    #[test]
    fn owner_readwrite_on_0444_denies() {
        let p = perm(1, 1, 0o444);
        let who = Principal::new(1);
        assert_eq!(
            decide(&p, &who, AccessMode::ReadWrite),
            Decision::Deny(Denial::InsufficientPrivilege)
        );
    }

    #[test]
    fn owner_writeonly_on_0444_denies() {
        let p = perm(1, 1, 0o444);
        let who = Principal::new(1);
        assert!(!decide(&p, &who, AccessMode::WriteOnly).allowed());
    }

    #[test]
    fn owner_any_mode_on_0644() {
        let p = perm(1, 1, 0o644);
        let who = Principal::new(1);
        for mode in [AccessMode::ReadOnly, AccessMode::WriteOnly, AccessMode::ReadWrite] {
            assert_eq!(decide(&p, &who, mode), Decision::Allow(mode));
        }
    }

    #[test]
    fn group_member_follows_group_triad() {
        // group triad lacks write on 0640, holds it on 0660
        let who = member(2, 10);
        assert!(!decide(&perm(1, 10, 0o640), &who, AccessMode::WriteOnly).allowed());
        assert!(decide(&perm(1, 10, 0o660), &who, AccessMode::WriteOnly).allowed());
    }

    #[test]
    fn supplementary_group_counts_as_membership() {
        let who = Principal { uid: 2, gid: 20, groups: vec![9, 10] };
        let p = perm(1, 10, 0o640);
        assert!(decide(&p, &who, AccessMode::ReadOnly).allowed());
        assert_eq!(effective(&p, &who), triad(0o4));
    }

    #[test]
    fn unrelated_user_follows_other_triad() {
        let p = perm(1, 10, 0o640);
        let who = member(3, 99);
        assert!(!decide(&p, &who, AccessMode::ReadOnly).allowed());
    }

    #[test]
    fn all_zero_record_denies_even_readonly() {
        let p = perm(1, 1, 0o000);
        let who = Principal::new(1);
        assert_eq!(
            decide(&p, &who, AccessMode::ReadOnly),
            Decision::Deny(Denial::InsufficientPrivilege)
        );
    }

    #[test]
    fn owner_tier_shadows_wider_group_tier() {
        // owner r--, group rw-: the owner is held to the owner triad
        // even though the file's group would grant more
        let p = perm(1, 10, 0o460);
        let who = member(1, 10);
        assert!(decide(&p, &who, AccessMode::ReadOnly).allowed());
        assert!(!decide(&p, &who, AccessMode::WriteOnly).allowed());
        assert!(!decide(&p, &who, AccessMode::ReadWrite).allowed());
    }

    #[test]
    fn group_tier_shadows_wider_other_tier() {
        let p = perm(1, 10, 0o604);
        let who = member(2, 10);
        assert!(!decide(&p, &who, AccessMode::ReadOnly).allowed());
    }

    #[test]
    fn bits_never_accumulate_across_tiers() {
        // owner r--, group -w-: together they would cover read-write,
        // but only the owner triad applies
        let p = perm(1, 10, 0o420);
        let who = member(1, 10);
        assert!(!decide(&p, &who, AccessMode::ReadWrite).allowed());
        assert!(!decide(&p, &who, AccessMode::WriteOnly).allowed());
    }

    #[test]
    fn no_partial_grant_for_readwrite() {
        let who = Principal::new(1);
        // read but not write
        assert!(!decide(&perm(1, 1, 0o400), &who, AccessMode::ReadWrite).allowed());
        // write but not read
        assert!(!decide(&perm(1, 1, 0o200), &who, AccessMode::ReadWrite).allowed());
        // both
        assert!(decide(&perm(1, 1, 0o600), &who, AccessMode::ReadWrite).allowed());
    }

    #[test]
    fn execute_substitutes_for_nothing() {
        let who = Principal::new(1);
        let p = perm(1, 1, 0o100);
        assert!(!decide(&p, &who, AccessMode::ReadOnly).allowed());
        assert!(!decide(&p, &who, AccessMode::WriteOnly).allowed());
        assert!(permits(&p, &who, EXEC));
    }

    #[test]
    fn readwrite_allow_implies_both_narrower_modes() {
        // monotonicity: granting a superset mode grants its subsets
        for bits in 0..8u16 {
            let p = perm(1, 1, bits << 6);
            let who = Principal::new(1);
            if decide(&p, &who, AccessMode::ReadWrite).allowed() {
                assert!(decide(&p, &who, AccessMode::ReadOnly).allowed());
                assert!(decide(&p, &who, AccessMode::WriteOnly).allowed());
            }
        }
    }

    #[test]
    fn allow_carries_the_requested_mode() {
        let p = perm(1, 1, 0o644);
        let who = Principal::new(1);
        match decide(&p, &who, AccessMode::ReadWrite) {
            Decision::Allow(m) => assert_eq!(m, AccessMode::ReadWrite),
            Decision::Deny(_) => panic!("expected allow"),
        }
    }

    #[test]
    fn permits_checks_only_requested_bits() {
        let p = perm(1, 1, 0o711);
        let stranger = member(9, 9);
        assert!(permits(&p, &stranger, EXEC));
        assert!(!permits(&p, &stranger, READ));
        assert!(!permits(&p, &stranger, WRITE));
    }

    #[test]
    fn required_bits_per_mode() {
        assert_eq!(AccessMode::ReadOnly.required(), READ);
        assert_eq!(AccessMode::WriteOnly.required(), WRITE);
        assert_eq!(AccessMode::ReadWrite.required(), Rwx::new(true, true, false));
    }
}
