#[derive(Debug, Clone)]
pub enum Message {
    // === TIMER MESSAGES ===
    TimerStarted { issue_key: String, summary: String },
    TimerReattached(String), // issue key
    TimerPaused(String),     // elapsed
    TimerResumed(String),    // elapsed
    TimerStatus { issue_key: String, elapsed: String, state: String },
    TimerStateRunning,
    TimerStatePaused,
    ActiveTimerExists(String), // issue key
    NoActiveTimer,
    TimerDetached(String),  // issue key
    TimerDiscarded(String), // issue key
    ConfirmDiscard(String), // human readable elapsed
    TimerStopped { issue_key: String, elapsed: String },

    // === WORKLOG MESSAGES ===
    WorklogLogged { issue_key: String, time: String },
    WorklogsLogged { succeeded: usize, total: usize, issue_key: String },
    WorklogsPartiallyLogged { succeeded: usize, total: usize, error: String },
    WorklogsFailed { total: usize, error: String },
    UnloggedTimeQueued(usize), // queued entries
    WorklogNotQueued { issue_key: String, time: String, started: String },
    RoundedEntriesNotice(usize),
    SubmissionPreview(usize), // entry count

    // === OFFLINE QUEUE MESSAGES ===
    QueueRetrying(usize),
    QueueRetryResult { total: usize, succeeded: usize, failed: usize },
    QueueEmpty,
    QueueHeader(usize),
    QueueCleared(usize),
    QueueEntryRemoved(usize),
    QueueIndexOutOfRange { index: usize, len: usize },
    QueueMalformed,
    ConfirmQueueClear(usize),

    // === AUTHENTICATION MESSAGES ===
    NotConfigured,
    AuthRefreshFailed(String),
    ConfirmReauthenticate,
    ReauthSucceeded,
    ReauthFailed(String),
    CredentialsRemoved,
    OAuthReauthUnsupported,

    // === API MESSAGES ===
    IssueNotFound(String),
    AuthenticationFailed,
    PermissionDenied,
    ApiRequestFailed(String),
    ConnectionOk { display_name: String, email: String },
    ConnectionFailed,
    NoAssignedIssues,
    IssueFetchFailed(String),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleJira,
    DefaultMessage(String),
    DefaultMessageNotSet,
    DefaultMessageSaved,
    DefaultMessageCleared,
    DefaultMessageUnreadable(String),
    DefaultMessageSaveFailed(String),

    // === MENU ITEMS ===
    MenuPause,
    MenuResume,
    MenuStop,
    MenuRefresh,
    MenuDetach,
    MenuDiscard,
    ModeSplit(usize), // segment count
    ModeSingle,
    FetchChoiceRetry,
    FetchChoiceReauthenticate,
    FetchChoiceQuit,

    // === PROMPTS ===
    PromptJiraHost,
    PromptJiraEmail,
    PromptJiraToken,
    PromptIssueKey,
    PromptSelectIssue,
    PromptTrackingAction,
    PromptDescription,
    PromptSaveDefault,
    PromptSelectMode,
    PromptConfirmSubmit,
    PromptFetchFailed,
}
