// Unit tests for domain models

#[cfg(test)]
mod tests {
    use crate::domain::errors::*;
    use crate::domain::model::*;
    use std::time::Duration;

    fn all_platforms() -> Vec<PlatformId> {
        vec![
            PlatformId::youtube(),
            PlatformId::tiktok(),
            PlatformId::instagram(),
        ]
    }

    #[test]
    fn test_platform_id_parse_normalizes() {
        assert_eq!(PlatformId::parse(" YouTube ").unwrap(), PlatformId::youtube());
        assert_eq!(PlatformId::parse("TIKTOK").unwrap().as_str(), "tiktok");
    }

    #[test]
    fn test_platform_id_parse_invalid() {
        assert!(PlatformId::parse("").is_err());
        assert!(PlatformId::parse("   ").is_err());
        assert!(PlatformId::parse("you tube").is_err());
        assert!(PlatformId::parse("x/y").is_err());
    }

    #[test]
    fn test_platform_id_accepts_unknown_names() {
        // Identifiers are open-ended; registration decides what gets dispatched
        assert_eq!(PlatformId::parse("vimeo").unwrap().as_str(), "vimeo");
    }

    #[test]
    fn test_platform_label() {
        assert_eq!(PlatformId::youtube().label(), "Youtube");
        assert_eq!(PlatformId::tiktok().label(), "Tiktok");
    }

    #[test]
    fn test_credential_blob_get_str_ignores_blanks() {
        let blob = CredentialBlob::from_pairs([("username", "alice"), ("password", "  ")]);
        assert_eq!(blob.get_str("username"), Some("alice"));
        assert_eq!(blob.get_str("password"), None);
        assert_eq!(blob.get_str("missing"), None);
    }

    #[test]
    fn test_task_descriptor_rejects_empty_platforms() {
        let result = TaskDescriptor::new(
            "video.mp4",
            "desc",
            "tags",
            Vec::<PlatformId>::new(),
            CredentialMap::new(),
        );
        assert_eq!(result.unwrap_err(), DomainError::EmptyPlatformSet);
    }

    #[test]
    fn test_task_descriptor_rejects_empty_path() {
        let result = TaskDescriptor::new("", "", "", all_platforms(), CredentialMap::new());
        assert!(matches!(result, Err(DomainError::BadArgs(_))));
    }

    #[test]
    fn test_task_descriptor_deduplicates_platforms() {
        let task = TaskDescriptor::new(
            "video.mp4",
            "",
            "",
            vec![PlatformId::youtube(), PlatformId::youtube(), PlatformId::tiktok()],
            CredentialMap::new(),
        )
        .unwrap();
        assert_eq!(task.platforms().len(), 2);
    }

    #[test]
    fn test_task_descriptor_credentials_for_missing_platform() {
        let mut creds = CredentialMap::new();
        creds.insert(
            PlatformId::tiktok(),
            CredentialBlob::from_pairs([("cookies_file", "/tmp/c.txt")]),
        );
        let task = TaskDescriptor::new("v.mp4", "", "", all_platforms(), creds).unwrap();

        assert_eq!(
            task.credentials_for(&PlatformId::tiktok()).get_str("cookies_file"),
            Some("/tmp/c.txt")
        );
        assert_eq!(task.credentials_for(&PlatformId::youtube()), CredentialBlob::empty());
    }

    #[test]
    fn test_outcome_exactly_one_field() {
        let ok = PlatformOutcome::succeeded(
            PlatformId::youtube(),
            PlatformPayload::new(serde_json::json!({"id": "abc"})),
            Duration::from_millis(5),
        );
        assert!(ok.is_ok());
        assert!(ok.payload().is_some());
        assert!(ok.error_message().is_none());

        let err = PlatformOutcome::failed(PlatformId::tiktok(), "boom", Duration::ZERO);
        assert!(!err.is_ok());
        assert!(err.payload().is_none());
        assert_eq!(err.error_message(), Some("boom"));
    }

    #[test]
    fn test_outcome_serializes_status_tag() {
        let err = PlatformOutcome::failed(PlatformId::tiktok(), "cookie file missing", Duration::ZERO);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error_message"], "cookie file missing");
        assert_eq!(json["platform"], "tiktok");
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_aggregate_result_single_write_per_platform() {
        let mut result = AggregateResult::new();
        assert!(result.insert(PlatformOutcome::failed(PlatformId::youtube(), "first", Duration::ZERO)));
        assert!(!result.insert(PlatformOutcome::failed(PlatformId::youtube(), "second", Duration::ZERO)));
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.get(&PlatformId::youtube()).unwrap().error_message(),
            Some("first")
        );
    }

    #[test]
    fn test_aggregate_result_summary_partial() {
        let mut result = AggregateResult::new();
        let payload = PlatformPayload::new(serde_json::json!({}));
        result.insert(PlatformOutcome::succeeded(PlatformId::youtube(), payload.clone(), Duration::ZERO));
        result.insert(PlatformOutcome::failed(PlatformId::tiktok(), "cookie file missing", Duration::ZERO));
        result.insert(PlatformOutcome::succeeded(PlatformId::instagram(), payload, Duration::ZERO));

        let summary = result.summary();
        assert_eq!(summary.kind, SummaryKind::PartialSuccess);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.to_string(), "2 of 3 succeeded");
    }

    #[test]
    fn test_run_summary_kinds() {
        assert_eq!(RunSummary::from_counts(0, 0).kind, SummaryKind::NothingDispatched);
        assert_eq!(RunSummary::from_counts(3, 3).kind, SummaryKind::AllSucceeded);
        assert_eq!(RunSummary::from_counts(0, 2).kind, SummaryKind::AllFailed);
        assert_eq!(RunSummary::from_counts(1, 2).kind, SummaryKind::PartialSuccess);
        assert_eq!(RunSummary::from_counts(0, 0).to_string(), "nothing to upload");
    }

    #[test]
    fn test_progress_state_percentages() {
        let mut progress = ProgressState::new(3);
        assert_eq!(progress.percentage(), 0);
        assert_eq!(progress.advance(), 33);
        assert_eq!(progress.advance(), 66);
        assert_eq!(progress.advance(), 100);
        assert!(progress.is_done());
    }

    #[test]
    fn test_progress_state_never_exceeds_total() {
        let mut progress = ProgressState::new(1);
        progress.advance();
        progress.advance();
        assert_eq!(progress.completed(), 1);
        assert_eq!(progress.percentage(), 100);
    }

    #[test]
    fn test_progress_state_empty_run_is_complete() {
        let progress = ProgressState::new(0);
        assert_eq!(progress.percentage(), 100);
        assert!(progress.is_done());
    }
}
