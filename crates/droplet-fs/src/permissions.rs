use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use crate::{Error, Result};

/// Unix permission modes handed out by the install layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionMode {
    /// `0o755` for every directory outside a writable subtree.
    Directory,

    /// `0o644` for every regular file.
    File,

    /// `0o755` for the entry-point script.
    Executable,

    /// `0o775` for everything below a writable subtree.
    GroupWritable,
}

impl PermissionMode {
    pub fn to_unix_mode(self) -> u32 {
        match self {
            Self::Directory => 0o755,
            Self::File => 0o644,
            Self::Executable => 0o755,
            Self::GroupWritable => 0o775,
        }
    }
}

/// Numeric owner applied to installed paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl Owner {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// The real uid/gid of the running process.
    pub fn current() -> Self {
        Self {
            uid: nix::unistd::Uid::current().as_raw(),
            gid: nix::unistd::Gid::current().as_raw(),
        }
    }
}

/// Configured `user:group` pair. Either side may be a name or a numeric id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerSpec {
    pub user: String,
    pub group: String,
}

impl OwnerSpec {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }

    /// Resolve names through the system user and group databases.
    pub fn resolve(&self) -> Result<Owner> {
        let uid = match self.user.parse::<u32>() {
            Ok(uid) => uid,
            Err(_) => nix::unistd::User::from_name(&self.user)
                .map_err(|source| Error::Lookup {
                    name: self.user.clone(),
                    source,
                })?
                .ok_or_else(|| Error::UnknownUser(self.user.clone()))?
                .uid
                .as_raw(),
        };
        let gid = match self.group.parse::<u32>() {
            Ok(gid) => gid,
            Err(_) => nix::unistd::Group::from_name(&self.group)
                .map_err(|source| Error::Lookup {
                    name: self.group.clone(),
                    source,
                })?
                .ok_or_else(|| Error::UnknownGroup(self.group.clone()))?
                .gid
                .as_raw(),
        };
        Ok(Owner { uid, gid })
    }
}

impl Default for OwnerSpec {
    fn default() -> Self {
        Self::new("www-data", "www-data")
    }
}

impl From<Owner> for OwnerSpec {
    fn from(owner: Owner) -> Self {
        Self::new(owner.uid.to_string(), owner.gid.to_string())
    }
}

impl FromStr for OwnerSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((user, group)) if !user.is_empty() && !group.is_empty() => {
                Ok(Self::new(user, group))
            }
            None if !s.is_empty() => Ok(Self::new(s, s)),
            _ => Err(Error::InvalidOwner(s.to_string())),
        }
    }
}

impl fmt::Display for OwnerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, self.group)
    }
}

/// The chown/chmod primitive the normalizer drives.
///
/// Implementations act on exactly one path and never recurse.
pub trait PermissionOps {
    /// Change the owner of `path` without following a final symlink.
    fn set_owner(&self, path: &Path, owner: Owner) -> io::Result<()>;

    fn set_mode(&self, path: &Path, mode: PermissionMode) -> io::Result<()>;
}

impl<T: PermissionOps + ?Sized> PermissionOps for &T {
    fn set_owner(&self, path: &Path, owner: Owner) -> io::Result<()> {
        (**self).set_owner(path, owner)
    }

    fn set_mode(&self, path: &Path, mode: PermissionMode) -> io::Result<()> {
        (**self).set_mode(path, mode)
    }
}

/// Direct system calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeOps;

impl PermissionOps for NativeOps {
    #[cfg(unix)]
    fn set_owner(&self, path: &Path, owner: Owner) -> io::Result<()> {
        std::os::unix::fs::lchown(path, Some(owner.uid), Some(owner.gid))
    }

    #[cfg(not(unix))]
    fn set_owner(&self, _path: &Path, _owner: Owner) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: PermissionMode) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode.to_unix_mode()))
    }

    #[cfg(not(unix))]
    fn set_mode(&self, path: &Path, mode: PermissionMode) -> io::Result<()> {
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_readonly(mode.to_unix_mode() & 0o222 == 0);
        std::fs::set_permissions(path, perms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn permission_mode_bits() {
        assert_eq!(PermissionMode::Directory.to_unix_mode(), 0o755);
        assert_eq!(PermissionMode::File.to_unix_mode(), 0o644);
        assert_eq!(PermissionMode::Executable.to_unix_mode(), 0o755);
        assert_eq!(PermissionMode::GroupWritable.to_unix_mode(), 0o775);
    }

    #[test]
    fn owner_spec_parse() {
        let spec: OwnerSpec = "www-data:staff".parse().unwrap();
        assert_eq!(spec, OwnerSpec::new("www-data", "staff"));

        let spec: OwnerSpec = "nginx".parse().unwrap();
        assert_eq!(spec, OwnerSpec::new("nginx", "nginx"));

        assert!(matches!(
            ":group".parse::<OwnerSpec>(),
            Err(Error::InvalidOwner(_))
        ));
        assert!(matches!("".parse::<OwnerSpec>(), Err(Error::InvalidOwner(_))));
        assert_eq!(OwnerSpec::default().to_string(), "www-data:www-data");
    }

    #[test]
    fn owner_spec_numeric_resolves_without_lookup() {
        let owner = OwnerSpec::new("1234", "5678").resolve().unwrap();
        assert_eq!(owner, Owner::new(1234, 5678));
    }

    #[test]
    fn owner_spec_round_trips_current_owner() {
        let current = Owner::current();
        assert_eq!(OwnerSpec::from(current).resolve().unwrap(), current);
    }

    #[test]
    fn owner_spec_unknown_user() {
        let spec = OwnerSpec::new("droplet-no-such-user", "0");
        assert!(matches!(
            spec.resolve(),
            Err(Error::UnknownUser(_) | Error::Lookup { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn native_ops_set_mode_and_owner() {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let dir = tempdir().unwrap();
        let file = dir.path().join("script");
        std::fs::write(&file, "#!/bin/sh\n").unwrap();

        NativeOps.set_mode(&file, PermissionMode::Executable).unwrap();
        let meta = std::fs::metadata(&file).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o755);

        let owner = Owner::current();
        NativeOps.set_owner(&file, owner).unwrap();
        let meta = std::fs::metadata(&file).unwrap();
        assert_eq!((meta.uid(), meta.gid()), (owner.uid, owner.gid));
    }

    #[cfg(unix)]
    #[test]
    fn native_ops_missing_path_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(NativeOps.set_mode(&missing, PermissionMode::File).is_err());
        assert!(NativeOps.set_owner(&missing, Owner::current()).is_err());
    }
}
