mod common;

#[cfg(test)]
mod tests {
    use super::common::{issue, temp_store, FailingStore, ManualClock, MockService, ScriptedReauth, T0};
    use jtimer::api::{ApiError, Auth, JiraConfig};
    use jtimer::libs::config::{ConfigStore, FileStore, DEFAULT_MESSAGE_KEY};
    use jtimer::libs::formatter::to_iso;
    use jtimer::libs::poster::NoReauth;
    use jtimer::libs::queue::{FailedWorklog, OfflineQueue};
    use jtimer::libs::segmenter::WorklogMode;
    use jtimer::libs::session::{Intent, Outcome, Phase, Session, Step, QUIT_CONFIRM_THRESHOLD_SECONDS};
    use serde_json::json;

    type TestSession<'a, R> = Session<MockService, &'a FileStore, &'a ManualClock, R>;

    fn new_session<'a>(store: &'a FileStore, clock: &'a ManualClock, service: MockService) -> TestSession<'a, NoReauth> {
        Session::new(service, store, clock, NoReauth)
    }

    fn describe(text: &str, save_as_default: bool) -> Intent {
        Intent::SubmitDescription {
            text: text.to_string(),
            save_as_default,
        }
    }

    fn queued(issue_key: &str) -> FailedWorklog {
        FailedWorklog {
            issue_key: issue_key.to_string(),
            time_spent_seconds: 600,
            comment: String::new(),
            started: to_iso(T0).unwrap(),
            failed_at: T0,
            error: "offline".to_string(),
        }
    }

    fn jira_config(access_token: &str) -> JiraConfig {
        JiraConfig {
            host: "https://acme.atlassian.net".to_string(),
            auth: Auth::OAuth {
                cloud_id: "cloud".to_string(),
                client_id: "client".to_string(),
                client_secret: "sealed-secret".to_string(),
                access_token: access_token.to_string(),
                refresh_token: "sealed-refresh".to_string(),
                expires_at: T0,
            },
        }
    }

    #[tokio::test]
    async fn test_split_flow_posts_one_worklog_per_period() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        session.begin("PROJ-1", "").unwrap();
        assert_eq!(session.phase(), Phase::Tracking);
        clock.advance_secs(600);
        assert_eq!(session.handle(Intent::Pause).await.unwrap(), Step::Continue);
        clock.advance_secs(300);
        assert_eq!(session.handle(Intent::Resume).await.unwrap(), Step::Continue);
        clock.advance_secs(300);
        assert_eq!(session.snapshot().unwrap().elapsed_seconds, 900);

        assert_eq!(session.handle(Intent::RequestStop).await.unwrap(), Step::Continue);
        assert_eq!(session.phase(), Phase::Describing);
        assert_eq!(store.active_timer().unwrap(), None);

        // Typing the description takes a while; nothing drifts.
        clock.advance_secs(1000);
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.elapsed_seconds, 900);
        assert!(snapshot.can_split);
        assert_eq!(snapshot.mode, Some(WorklogMode::Split));
        assert_eq!(snapshot.entries.len(), 2);

        assert_eq!(session.handle(describe("Code review", false)).await.unwrap(), Step::Continue);
        assert_eq!(session.phase(), Phase::ChoosingMode);
        assert_eq!(session.handle(Intent::ChooseMode(WorklogMode::Split)).await.unwrap(), Step::Continue);
        assert_eq!(session.phase(), Phase::Confirming);

        let Step::Finished(Outcome::Logged(report)) = session.handle(Intent::ConfirmSubmit).await.unwrap() else {
            panic!("expected a logged outcome");
        };
        assert!(report.all_succeeded());
        assert_eq!(report.total, 2);
        assert_eq!(session.phase(), Phase::Finished);

        let posts = session.service().posts.borrow();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].seconds, 600);
        assert_eq!(posts[0].started.timestamp_millis(), T0);
        assert_eq!(posts[1].seconds, 300);
        assert_eq!(posts[1].started.timestamp_millis(), T0 + 900_000);
        assert!(posts.iter().all(|call| call.comment == "Code review" && call.issue_key == "PROJ-1"));
    }

    #[tokio::test]
    async fn test_single_mode_posts_net_time() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(600);
        session.handle(Intent::Pause).await.unwrap();
        clock.advance_secs(300);
        session.handle(Intent::Resume).await.unwrap();
        clock.advance_secs(300);
        session.handle(Intent::RequestStop).await.unwrap();
        session.handle(describe("Review", false)).await.unwrap();
        session.handle(Intent::ChooseMode(WorklogMode::Single)).await.unwrap();
        session.handle(Intent::ConfirmSubmit).await.unwrap();

        assert_eq!(session.service().posted_seconds(), vec![900]);
    }

    #[tokio::test]
    async fn test_unpaused_timer_skips_mode_choice() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(45);
        session.handle(Intent::RequestStop).await.unwrap();
        session.handle(describe("Typo", false)).await.unwrap();

        assert_eq!(session.phase(), Phase::Confirming);
        assert_eq!(session.handle(Intent::ChooseMode(WorklogMode::Split)).await.unwrap(), Step::Ignored);
        session.handle(Intent::ConfirmSubmit).await.unwrap();
        assert_eq!(session.service().posted_seconds(), vec![60]);
    }

    #[tokio::test]
    async fn test_intents_outside_their_phase_are_ignored() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        assert_eq!(session.handle(Intent::Pause).await.unwrap(), Step::Ignored);
        assert_eq!(session.handle(Intent::RequestStop).await.unwrap(), Step::Ignored);

        let timer = session.begin("PROJ-1", "").unwrap();
        assert_eq!(session.handle(Intent::Resume).await.unwrap(), Step::Ignored);
        assert_eq!(session.handle(Intent::ConfirmSubmit).await.unwrap(), Step::Ignored);
        assert_eq!(session.handle(describe("x", true)).await.unwrap(), Step::Ignored);
        assert_eq!(store.active_timer().unwrap(), Some(timer));
        assert_eq!(store.default_message().unwrap(), None);

        session.handle(Intent::RequestStop).await.unwrap();
        assert_eq!(session.handle(Intent::Pause).await.unwrap(), Step::Ignored);
        assert_eq!(session.handle(Intent::ConfirmSubmit).await.unwrap(), Step::Ignored);
        assert_eq!(session.handle(Intent::Detach).await.unwrap(), Step::Ignored);
        assert_eq!(session.phase(), Phase::Describing);
    }

    #[tokio::test]
    async fn test_quit_below_threshold_discards_silently() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(QUIT_CONFIRM_THRESHOLD_SECONDS - 1);

        let step = session.handle(Intent::Quit { confirmed: false }).await.unwrap();

        assert!(matches!(step, Step::Finished(Outcome::Discarded(timer)) if timer.issue_key == "PROJ-1"));
        assert_eq!(store.active_timer().unwrap(), None);
        assert!(session.service().posts.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_quit_at_threshold_needs_confirmation() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(QUIT_CONFIRM_THRESHOLD_SECONDS);

        let step = session.handle(Intent::Quit { confirmed: false }).await.unwrap();
        assert_eq!(step, Step::ConfirmQuit { elapsed_seconds: 300 });
        assert!(store.active_timer().unwrap().is_some());
        assert_eq!(session.phase(), Phase::Tracking);

        let step = session.handle(Intent::Quit { confirmed: true }).await.unwrap();
        assert!(matches!(step, Step::Finished(Outcome::Discarded(_))));
        assert_eq!(store.active_timer().unwrap(), None);
    }

    #[tokio::test]
    async fn test_quit_after_stop_uses_frozen_elapsed() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(200);
        session.handle(Intent::RequestStop).await.unwrap();
        clock.advance_secs(3600);

        let step = session.handle(Intent::Quit { confirmed: false }).await.unwrap();

        assert!(matches!(step, Step::Finished(Outcome::Discarded(_))));
        assert!(session.service().posts.borrow().is_empty());
        assert!(OfflineQueue::new(&store).is_empty());
    }

    #[tokio::test]
    async fn test_detach_keeps_timer_running() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        let timer = session.begin("PROJ-1", "Deploy").unwrap();
        clock.advance_secs(3600);

        let step = session.handle(Intent::Detach).await.unwrap();

        assert_eq!(step, Step::Finished(Outcome::Detached(timer.clone())));
        assert_eq!(store.active_timer().unwrap(), Some(timer));

        let mut resumed = new_session(&store, &clock, MockService::default());
        assert_eq!(resumed.attach().unwrap().issue_key, "PROJ-1");
        assert_eq!(resumed.snapshot().unwrap().elapsed_seconds, 3600);
    }

    #[tokio::test]
    async fn test_begin_and_attach_guard_the_single_timer() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        assert!(session.attach().is_err());
        session.begin("PROJ-1", "").unwrap();

        let error = session.begin("PROJ-2", "").unwrap_err();
        assert!(error.to_string().contains("PROJ-1"));
        assert_eq!(store.active_timer().unwrap().unwrap().issue_key, "PROJ-1");
    }

    #[tokio::test]
    async fn test_empty_description_falls_back_to_default() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        store.set_default_message("Daily standup").unwrap();
        let mut session = new_session(&store, &clock, MockService::default());

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(120);
        session.handle(Intent::RequestStop).await.unwrap();
        session.handle(describe("   ", true)).await.unwrap();

        assert_eq!(session.snapshot().unwrap().timer.unwrap().description, "Daily standup");
        session.handle(Intent::ConfirmSubmit).await.unwrap();
        assert_eq!(session.service().posts.borrow()[0].comment, "Daily standup");
        assert_eq!(store.default_message().unwrap(), Some("Daily standup".to_string()));
    }

    #[tokio::test]
    async fn test_description_can_become_the_default() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(120);
        session.handle(Intent::RequestStop).await.unwrap();
        session.handle(describe("  Sprint planning ", true)).await.unwrap();

        assert_eq!(store.default_message().unwrap(), Some("Sprint planning".to_string()));
    }

    #[tokio::test]
    async fn test_failed_submission_is_queued() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let service = MockService::with_post_results(vec![Err(ApiError::Unknown("connection reset".to_string()))]);
        let mut session = new_session(&store, &clock, service);

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(30);
        session.handle(Intent::RequestStop).await.unwrap();
        session.handle(describe("Hotfix", false)).await.unwrap();
        let Step::Finished(Outcome::Logged(report)) = session.handle(Intent::ConfirmSubmit).await.unwrap() else {
            panic!("expected a logged outcome");
        };

        assert_eq!(report.failed_entries, 1);
        let queued = OfflineQueue::new(&store).list();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].time_spent_seconds, 30);
        assert_eq!(queued[0].comment, "Hotfix");
    }

    #[tokio::test]
    async fn test_reauth_during_submission() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let service = MockService::with_post_results(vec![Err(ApiError::AuthenticationFailed), Ok(())]);
        let mut reauth = ScriptedReauth::new(vec![true]);
        {
            let mut session = Session::new(service, &store, &clock, &mut reauth);
            session.begin("PROJ-1", "").unwrap();
            clock.advance_secs(600);
            session.handle(Intent::RequestStop).await.unwrap();
            session.handle(describe("", false)).await.unwrap();
            let Step::Finished(Outcome::Logged(report)) = session.handle(Intent::ConfirmSubmit).await.unwrap() else {
                panic!("expected a logged outcome");
            };
            assert!(report.all_succeeded());
        }
        assert_eq!(reauth.prompts, 1);
        assert!(OfflineQueue::new(&store).is_empty());
    }

    #[tokio::test]
    async fn test_start_drains_queue() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let queue = OfflineQueue::new(&store);
        queue.enqueue(queued("PROJ-1")).unwrap();
        queue.enqueue(queued("PROJ-2")).unwrap();
        let service = MockService::with_post_results(vec![Err(ApiError::PermissionDenied), Ok(())]);
        let mut session = new_session(&store, &clock, service);

        let report = session.retry_failed_worklogs().await.unwrap().unwrap();

        assert_eq!((report.total, report.succeeded, report.failed), (2, 1, 1));
        assert_eq!(queue.list(), vec![queued("PROJ-2")]);
    }

    #[tokio::test]
    async fn test_empty_queue_is_not_replayed() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let service = MockService {
            expiring: true.into(),
            refresh_result: Some(ApiError::AuthenticationFailed),
            ..MockService::default()
        };
        let mut session = new_session(&store, &clock, service);

        assert_eq!(session.retry_failed_worklogs().await.unwrap(), None);
        assert_eq!(session.service().refreshes.get(), 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_state_untouched() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let queue = OfflineQueue::new(&store);
        queue.enqueue(queued("PROJ-1")).unwrap();
        let service = MockService {
            expiring: true.into(),
            refresh_result: Some(ApiError::AuthenticationFailed),
            config: Some(jira_config("old")),
            ..MockService::default()
        };
        let mut session = new_session(&store, &clock, service);
        let timer = session.begin("PROJ-2", "").unwrap();

        assert!(session.retry_failed_worklogs().await.is_err());
        assert!(session.fetch_issue("PROJ-2").await.is_err());

        assert_eq!(session.service().refreshes.get(), 2);
        assert!(session.service().posts.borrow().is_empty());
        assert_eq!(queue.list(), vec![queued("PROJ-1")]);
        assert_eq!(store.active_timer().unwrap(), Some(timer));
        assert_eq!(store.jira().unwrap(), None);
    }

    #[tokio::test]
    async fn test_refreshed_credentials_are_persisted() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let service = MockService {
            expiring: true.into(),
            config: Some(jira_config("fresh")),
            issues: vec![issue("PROJ-1", "Fix login")],
            ..MockService::default()
        };
        let mut session = new_session(&store, &clock, service);

        let fetched = session.fetch_issue("PROJ-1").await.unwrap();

        assert_eq!(fetched.summary, "Fix login");
        assert_eq!(session.service().refreshes.get(), 1);
        assert_eq!(store.jira().unwrap(), Some(jira_config("fresh")));

        session.fetch_issue("PROJ-1").await.unwrap();
        assert_eq!(session.service().refreshes.get(), 1);
    }

    #[tokio::test]
    async fn test_fetch_errors_keep_their_class() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let mut session = new_session(&store, &clock, MockService::default());

        let error = session.fetch_issue("NOPE-1").await.unwrap_err();

        assert_eq!(error.downcast_ref::<ApiError>(), Some(&ApiError::NotFound("NOPE-1".to_string())));
    }

    #[tokio::test]
    async fn test_reauthenticate_persists_credentials() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let service = MockService {
            config: Some(jira_config("replaced")),
            ..MockService::default()
        };
        let mut session = new_session(&store, &clock, service);

        session.reauthenticate().await.unwrap();

        assert_eq!(session.service().reauths.get(), 1);
        assert_eq!(store.jira().unwrap(), Some(jira_config("replaced")));
    }

    #[tokio::test]
    async fn test_failed_reauthenticate_writes_nothing() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let service = MockService {
            config: Some(jira_config("rejected")),
            reauth_result: Some(ApiError::AuthenticationFailed),
            ..MockService::default()
        };
        let mut session = new_session(&store, &clock, service);

        assert_eq!(session.reauthenticate().await, Err(ApiError::AuthenticationFailed));
        assert_eq!(store.jira().unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_failure_at_submit_queues_the_stopped_time() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        let service = MockService {
            refresh_result: Some(ApiError::AuthenticationFailed),
            ..MockService::default()
        };
        let mut session = new_session(&store, &clock, service);

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(240);
        session.handle(Intent::RequestStop).await.unwrap();
        session.handle(describe("Bugfix", false)).await.unwrap();
        session.service().expiring.set(true);

        let Step::Finished(Outcome::Logged(report)) = session.handle(Intent::ConfirmSubmit).await.unwrap() else {
            panic!("expected a logged outcome");
        };

        assert_eq!((report.total, report.succeeded_entries, report.failed_entries), (1, 0, 1));
        assert!(report.unqueued.is_empty());
        assert!(session.service().posts.borrow().is_empty());
        assert_eq!(session.phase(), Phase::Finished);

        let queued = OfflineQueue::new(&store).list();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].issue_key, "PROJ-1");
        assert_eq!(queued[0].time_spent_seconds, 240);
        assert_eq!(queued[0].comment, "Bugfix");
        assert_eq!(queued[0].started, to_iso(T0).unwrap());
        assert!(queued[0].error.contains("authentication failed"));
    }

    #[tokio::test]
    async fn test_unreadable_default_message_does_not_lose_the_timer() {
        let (_dir, store) = temp_store();
        let clock = ManualClock::new(T0);
        store.set(DEFAULT_MESSAGE_KEY, json!(42)).unwrap();
        let mut session = new_session(&store, &clock, MockService::default());

        assert_eq!(session.default_message(), None);
        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(3600);
        session.handle(Intent::RequestStop).await.unwrap();

        assert_eq!(session.handle(describe("", false)).await.unwrap(), Step::Continue);
        assert_eq!(session.phase(), Phase::Confirming);
        session.handle(Intent::ConfirmSubmit).await.unwrap();

        let posts = session.service().posts.borrow();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].seconds, 3600);
        assert_eq!(posts[0].comment, "");
    }

    #[tokio::test]
    async fn test_unsaved_default_message_still_submits() {
        let (_dir, inner) = temp_store();
        let store = FailingStore::new(inner, &[DEFAULT_MESSAGE_KEY]);
        let clock = ManualClock::new(T0);
        let mut session = Session::new(MockService::default(), &store, &clock, NoReauth);

        session.begin("PROJ-1", "").unwrap();
        clock.advance_secs(600);
        session.handle(Intent::RequestStop).await.unwrap();

        assert_eq!(session.handle(describe("Planning", true)).await.unwrap(), Step::Continue);
        session.handle(Intent::ConfirmSubmit).await.unwrap();

        assert_eq!(session.service().posts.borrow()[0].comment, "Planning");
        assert_eq!(store.default_message().unwrap(), None);
    }
}
