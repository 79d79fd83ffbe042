//! SPMD coordination: every participant runs the same code path and the
//! coordinating participant (rank 0) fans configuration out to the others
//! through one blocking collective.
//!
//! Broadcast payloads travel as JSON bytes, so an in-process group and an
//! MPI world exchange exactly the same representation.

#[cfg(feature = "mpi-support")]
mod mpi_world;

#[cfg(feature = "mpi-support")]
pub use mpi_world::{MpiComm, MpiSession};

use crate::domain::{DielecError, DielecResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

pub const ROOT_RANK: usize = 0;

/// Environment variables through which common launchers (Open MPI, MPICH
/// and Intel MPI via PMI, MVAPICH2) publish the world size.
const LAUNCHER_SIZE_VARIABLES: [&str; 3] =
    ["OMPI_COMM_WORLD_SIZE", "PMI_SIZE", "MV2_COMM_WORLD_SIZE"];

pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn is_root(&self) -> bool {
        self.rank() == ROOT_RANK
    }

    /// Blocking collective. The root passes `Some(value)`, the others pass
    /// `None`; every participant returns the root's value once all of them
    /// have arrived.
    fn broadcast<T: Serialize + DeserializeOwned>(&self, value: Option<T>) -> DielecResult<T>;
}

/// True when this process is one of several ranks started by an MPI
/// launcher.
pub fn launched_under_mpi() -> bool {
    launcher_world_size(|name| std::env::var_os(name)).is_some_and(|size| size > 1)
}

/// World size announced by the launcher, if any.
pub fn launcher_world_size(lookup: impl Fn(&str) -> Option<OsString>) -> Option<usize> {
    LAUNCHER_SIZE_VARIABLES.iter().find_map(|name| {
        lookup(name)?
            .to_str()
            .and_then(|value| value.trim().parse::<usize>().ok())
    })
}

/// Single-participant communicator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        ROOT_RANK
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast<T: Serialize + DeserializeOwned>(&self, value: Option<T>) -> DielecResult<T> {
        value.ok_or_else(missing_root_payload)
    }
}

/// Encodes the root's proposal. `None` encodes as `null` so receivers can
/// tell a missing payload from a malformed one.
pub(crate) fn encode_payload<T: Serialize>(value: Option<&T>) -> DielecResult<Vec<u8>> {
    serde_json::to_vec(&value).map_err(|error| {
        DielecError::internal(
            "SYS.BROADCAST_ENCODE",
            format!("broadcast payload could not be serialized: {error}"),
        )
    })
}

pub(crate) fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> DielecResult<T> {
    serde_json::from_slice::<Option<T>>(bytes)
        .map_err(|error| {
            DielecError::internal(
                "SYS.BROADCAST_DECODE",
                format!("broadcast payload could not be deserialized: {error}"),
            )
        })?
        .ok_or_else(missing_root_payload)
}

/// Bytes the root sends when it has nothing valid to share.
pub(crate) const NULL_PAYLOAD: &[u8] = b"null";

struct BroadcastSlot {
    payload: Mutex<Vec<u8>>,
    barrier: Barrier,
}

/// Handle given to one participant of a [`LocalProcessGroup`].
pub struct LocalComm {
    rank: usize,
    size: usize,
    slot: Arc<BroadcastSlot>,
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast<T: Serialize + DeserializeOwned>(&self, value: Option<T>) -> DielecResult<T> {
        // Every participant passes both barriers, whatever happens in
        // between, so a failure on one rank never strands the others.
        let mut local_failure = None;
        if self.is_root() {
            let bytes = encode_payload(value.as_ref()).unwrap_or_else(|error| {
                local_failure = Some(error);
                NULL_PAYLOAD.to_vec()
            });
            match self.slot.payload.lock() {
                Ok(mut payload) => *payload = bytes,
                Err(_) => local_failure = Some(poisoned_slot()),
            }
        } else if value.is_some() {
            tracing::debug!(rank = self.rank, "ignoring broadcast payload from non-root rank");
        }

        self.slot.barrier.wait();
        let received = self
            .slot
            .payload
            .lock()
            .map_err(|_| poisoned_slot())
            .map(|payload| payload.clone());
        self.slot.barrier.wait();

        if let Some(error) = local_failure {
            return Err(error);
        }
        decode_payload(&received?)
    }
}

/// In-process SPMD group: `size` participants on scoped threads. Stands in
/// for an MPI world in tests.
#[derive(Debug, Clone, Copy)]
pub struct LocalProcessGroup {
    size: usize,
}

impl LocalProcessGroup {
    pub fn new(size: usize) -> DielecResult<Self> {
        if size == 0 {
            return Err(DielecError::configuration(
                "INPUT.PROCESS_COUNT",
                "process group requires at least one participant",
            ));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `body` on every participant and returns the results in rank order.
    pub fn run<R, F>(&self, body: F) -> DielecResult<Vec<R>>
    where
        R: Send,
        F: Fn(LocalComm) -> R + Sync,
    {
        let slot = Arc::new(BroadcastSlot {
            payload: Mutex::new(Vec::new()),
            barrier: Barrier::new(self.size),
        });
        let body = &body;

        thread::scope(|scope| {
            let handles: Vec<_> = (0..self.size)
                .map(|rank| {
                    let comm = LocalComm {
                        rank,
                        size: self.size,
                        slot: Arc::clone(&slot),
                    };
                    scope.spawn(move || body(comm))
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle.join().map_err(|_| {
                        DielecError::internal(
                            "SYS.PROCESS_GROUP",
                            format!("participant {rank} terminated abnormally"),
                        )
                    })
                })
                .collect()
        })
    }
}

pub(crate) fn missing_root_payload() -> DielecError {
    DielecError::internal(
        "SYS.BROADCAST_ROOT",
        "coordinating participant did not supply a broadcast value",
    )
}

fn poisoned_slot() -> DielecError {
    DielecError::internal("SYS.BROADCAST_LOCK", "broadcast slot lock is poisoned")
}

#[cfg(test)]
mod tests {
    use super::{Communicator, LocalProcessGroup, ROOT_RANK, SerialComm, launcher_world_size};
    use crate::domain::DielecError;
    use std::collections::BTreeMap;
    use std::ffi::OsString;

    #[test]
    fn serial_broadcast_returns_root_value() {
        let comm = SerialComm;
        assert!(comm.is_root());
        assert_eq!(comm.size(), 1);
        assert_eq!(comm.broadcast(Some(42_u32)).expect("value"), 42);
        assert!(comm.broadcast::<u32>(None).is_err());
    }

    #[test]
    fn every_participant_receives_the_root_value() {
        let group = LocalProcessGroup::new(4).expect("group");
        let results = group
            .run(|comm| {
                let value = comm.is_root().then(|| vec![1.5_f64, 2.5, comm.rank() as f64]);
                (comm.rank(), comm.broadcast(value).expect("broadcast"))
            })
            .expect("group run");

        assert_eq!(results.len(), 4);
        for (rank, (reported, value)) in results.into_iter().enumerate() {
            assert_eq!(rank, reported);
            assert_eq!(value, vec![1.5, 2.5, ROOT_RANK as f64]);
        }
    }

    #[test]
    fn consecutive_broadcasts_do_not_interleave() {
        let group = LocalProcessGroup::new(3).expect("group");
        let results = group
            .run(|comm| {
                let first = comm.broadcast(comm.is_root().then_some(1_i32)).expect("first");
                let second = comm
                    .broadcast(comm.is_root().then(|| "two".to_string()))
                    .expect("second");
                (first, second)
            })
            .expect("group run");

        assert!(results.iter().all(|(first, second)| *first == 1 && second == "two"));
    }

    #[test]
    fn root_errors_fan_out_to_all_participants() {
        let group = LocalProcessGroup::new(3).expect("group");
        let results = group
            .run(|comm| {
                let payload: Option<Result<f64, DielecError>> = comm.is_root().then(|| {
                    Err(DielecError::configuration("INPUT.TEST", "root failed"))
                });
                comm.broadcast(payload).expect("collective completes")
            })
            .expect("group run");

        for result in results {
            let error = result.expect_err("every rank sees the root error");
            assert_eq!(error.placeholder(), "INPUT.TEST");
        }
    }

    #[test]
    fn grids_arrive_bit_identical() {
        let values: Vec<f64> = (0..66).map(|k| 0.1 + 7.5 * k as f64 / 3.0).collect();
        let group = LocalProcessGroup::new(2).expect("group");
        let results = group
            .run(|comm| comm.broadcast(comm.is_root().then(|| values.clone())).expect("grid"))
            .expect("group run");

        for received in results {
            let bits: Vec<u64> = received.iter().map(|value| value.to_bits()).collect();
            let expected: Vec<u64> = values.iter().map(|value| value.to_bits()).collect();
            assert_eq!(bits, expected);
        }
    }

    #[test]
    fn unencodable_root_payload_releases_every_participant() {
        let group = LocalProcessGroup::new(3).expect("group");
        let results = group
            .run(|comm| {
                // JSON object keys must be strings.
                let payload = comm.is_root().then(|| BTreeMap::from([((1_u8, 2_u8), 3_u8)]));
                comm.broadcast(payload)
            })
            .expect("group run");

        assert_eq!(
            results[0].as_ref().expect_err("root").placeholder(),
            "SYS.BROADCAST_ENCODE"
        );
        for result in &results[1..] {
            assert_eq!(
                result.as_ref().expect_err("receiver").placeholder(),
                "SYS.BROADCAST_ROOT"
            );
        }
    }

    #[test]
    fn launcher_size_comes_from_known_variables() {
        let open_mpi = |name: &str| (name == "OMPI_COMM_WORLD_SIZE").then(|| OsString::from("4"));
        assert_eq!(launcher_world_size(open_mpi), Some(4));

        let hydra = |name: &str| (name == "PMI_SIZE").then(|| OsString::from(" 2 "));
        assert_eq!(launcher_world_size(hydra), Some(2));

        let garbled = |name: &str| (name == "PMI_SIZE").then(|| OsString::from("many"));
        assert_eq!(launcher_world_size(garbled), None);

        assert_eq!(launcher_world_size(|_| None), None);
    }

    #[test]
    fn empty_group_is_rejected() {
        let error = LocalProcessGroup::new(0).expect_err("zero participants");
        assert_eq!(error.placeholder(), "INPUT.PROCESS_COUNT");
    }
}
