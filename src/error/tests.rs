//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("invalid lock port");
        assert_eq!(err.to_string(), "configuration error: invalid lock port");
    }

    #[test]
    fn test_validation_error_delay() {
        let err = ValidationError::delay(-1.5, "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid delay value '-1.5': must be non-negative"
        );
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: Error = ValidationError::EmptyAllowlist.into();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_watch_init_error_conversion() {
        let watch_err = WatchInitError::NotFound {
            path: "/tmp/missing".to_string(),
        };
        let err: Error = watch_err.into();
        assert!(matches!(err, Error::WatchInit(_)));
        assert_eq!(
            err.to_string(),
            "watch error: directory '/tmp/missing' does not exist"
        );
    }

    #[test]
    fn test_watch_init_error_path() {
        let err = WatchInitError::WatchFailed {
            path: "/media/drop".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(err.path(), "/media/drop");
        assert_eq!(
            err.to_string(),
            "failed to watch '/media/drop': permission denied"
        );
    }

    #[test]
    fn test_launch_error_exit_status() {
        let err = LaunchError::ExitStatus {
            program: "xdg-open".to_string(),
            path: "/videos/clip.mp4".to_string(),
            status: "exit status: 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "'xdg-open' exited with exit status: 3 for '/videos/clip.mp4'"
        );
        let err: Error = err.into();
        assert!(matches!(err, Error::Launch(_)));
    }

    #[test]
    fn test_already_running_display() {
        let err = AlreadyRunningError {
            address: "127.0.0.1:47613".to_string(),
        };
        assert!(err.to_string().contains("127.0.0.1:47613"));
        let err: Error = err.into();
        assert!(matches!(err, Error::AlreadyRunning(_)));
    }

    #[test]
    fn test_session_error_transition() {
        let err = SessionError::InvalidTransition {
            from: SessionState::Stopped,
            action: "pause",
        };
        assert_eq!(err.to_string(), "cannot pause while stopped");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_internal() {
        let err = Error::internal("consumer task panicked");
        assert_eq!(err.to_string(), "internal error: consumer task panicked");
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> std::result::Result<(), ValidationError> {
            Err(ValidationError::EmptyDirectory)
        }

        fn outer() -> Result<i32> {
            inner()?;
            Ok(0)
        }

        let result = outer();
        assert_eq!(
            result.unwrap_err().to_string(),
            "validation error: watch directory cannot be empty"
        );
    }
}
