use std::path::{Path, PathBuf};

/// Puts HOME and the working directory back, even when the test panics.
struct RestoreEnv {
    home: Option<String>,
    cwd: PathBuf,
}

impl Drop for RestoreEnv {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.cwd);
        match self.home.take() {
            // SAFETY: HOME is only mutated by tests holding HOME_MUTEX.
            Some(old) => unsafe { std::env::set_var("HOME", old) },
            // SAFETY: see above.
            None => unsafe { std::env::remove_var("HOME") },
        }
    }
}

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    static HOME_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = HOME_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let _restore = RestoreEnv {
        home: std::env::var("HOME").ok(),
        cwd: std::env::current_dir().expect("cwd"),
    };
    // SAFETY: HOME is only mutated by tests holding HOME_MUTEX.
    unsafe { std::env::set_var("HOME", dir.path()) };
    std::env::set_current_dir(dir.path()).expect("enter tempdir");
    func(dir.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_inside_temp_home_does_not_break_later_calls() {
        let result = std::panic::catch_unwind(|| {
            with_temp_home(|_| panic!("boom"));
        });
        assert!(result.is_err());
        with_temp_home(|home| {
            let cwd = std::env::current_dir().expect("cwd");
            assert_eq!(cwd.canonicalize().ok(), home.canonicalize().ok());
            assert_eq!(
                std::env::var("HOME").ok().map(PathBuf::from),
                Some(home.to_path_buf())
            );
        });
    }
}
