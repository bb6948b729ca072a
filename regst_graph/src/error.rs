//! Errors raised by the plan improver.
//!
//! Follows the fatal/ordinary split of the improver's error model: every
//! variant here is a *fatal* precondition violation that aborts improvement.
//! Recoverable outcomes (empty candidate pools, singleton color classes, a
//! tail with no consumers) never construct an `Error` at all -- they are the
//! natural empty/zero case of the data they fall out of.

/// Convenience wrapper for a result that may fail with a fatal [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal error that aborts the current improvement run.
#[derive(Clone)]
pub struct Error {
    kind: Box<ErrorKind>,
    post_msg: Option<String>,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(post) = &self.post_msg {
            write!(f, "\n{}", post)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn with_post_msg(mut self, msg: Option<String>) -> Self {
        self.post_msg = msg;
        self
    }

    pub fn mem_shared_register_mismatch(regst_desc_id: i64, register_num: u64) -> Self {
        Self::new(ErrorKind::MemSharedRegisterMismatch {
            regst_desc_id,
            register_num,
        })
    }

    pub fn not_mem_sharable(regst_desc_id: i64) -> Self {
        Self::new(ErrorKind::NotMemSharable { regst_desc_id })
    }

    pub fn duplicate_order_in_graph(task_id: i64, order_in_graph: i64) -> Self {
        Self::new(ErrorKind::DuplicateOrderInGraph {
            task_id,
            order_in_graph,
        })
    }

    pub fn non_positive_available_mem(machine_id: i64, zone_id: i64, mem_size: i64) -> Self {
        Self::new(ErrorKind::NonPositiveAvailableMem {
            machine_id,
            zone_id,
            mem_size,
        })
    }

    pub fn infeasible_at_max_duration(max_duration: f64) -> Self {
        Self::new(ErrorKind::InfeasibleAtMaxDuration { max_duration })
    }

    pub fn unknown_regst_desc(regst_desc_id: i64) -> Self {
        Self::new(ErrorKind::UnknownRegstDesc { regst_desc_id })
    }

    pub fn unknown_task(task_id: i64) -> Self {
        Self::new(ErrorKind::UnknownTask { task_id })
    }

    pub fn misc<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::Misc(msg.to_string()))
    }

    fn new(kind: ErrorKind) -> Self {
        Error {
            kind: Box::new(kind),
            post_msg: None,
        }
    }
}

#[derive(Clone)]
enum ErrorKind {
    /// A regst-desc carries `mem_shared_id != -1` with `register_num != 1`.
    MemSharedRegisterMismatch { regst_desc_id: i64, register_num: u64 },
    /// A regst-desc was offered to a sharing pool without `enable_mem_sharing`.
    NotMemSharable { regst_desc_id: i64 },
    /// Two producers in one mem-share group share `order_in_graph`.
    DuplicateOrderInGraph { task_id: i64, order_in_graph: i64 },
    /// `AvailableMemSize` computed as <= 0.
    NonPositiveAvailableMem {
        machine_id: i64,
        zone_id: i64,
        mem_size: i64,
    },
    /// The plan does not fit even at `ii = max_duration`.
    InfeasibleAtMaxDuration { max_duration: f64 },
    /// A regst-desc-id was referenced that is not present in the plan.
    UnknownRegstDesc { regst_desc_id: i64 },
    /// A task-id was referenced that is not present in the plan.
    UnknownTask { task_id: i64 },
    /// Miscellaneous error, used at the I/O edges (file/JSON parsing).
    Misc(String),
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorKind::*;
        match self {
            MemSharedRegisterMismatch {
                regst_desc_id,
                register_num,
            } => write!(
                f,
                "regst-desc {regst_desc_id} is mem-shared but register_num is {register_num}, not 1"
            ),
            NotMemSharable { regst_desc_id } => write!(
                f,
                "regst-desc {regst_desc_id} was offered to a sharing pool without enable_mem_sharing"
            ),
            DuplicateOrderInGraph {
                task_id,
                order_in_graph,
            } => write!(
                f,
                "task {task_id} shares order_in_graph {order_in_graph} with another producer in its mem-share group"
            ),
            NonPositiveAvailableMem {
                machine_id,
                zone_id,
                mem_size,
            } => write!(
                f,
                "available memory for machine {machine_id} zone {zone_id} computed as {mem_size} (<= 0)"
            ),
            InfeasibleAtMaxDuration { max_duration } => write!(
                f,
                "plan does not fit in memory even at ii = max_duration ({max_duration})"
            ),
            UnknownRegstDesc { regst_desc_id } => {
                write!(f, "unknown regst-desc-id: {regst_desc_id}")
            }
            UnknownTask { task_id } => write!(f, "unknown task-id: {task_id}"),
            Misc(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::misc(format!("IO error: {e}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::misc(format!("serde_json error: {e}"))
    }
}
