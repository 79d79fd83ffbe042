//! MPI backend: one participant per rank of `MPI_COMM_WORLD`.

use super::{Communicator, NULL_PAYLOAD, ROOT_RANK, decode_payload, encode_payload};
use crate::domain::{DielecError, DielecResult};
use ::mpi::environment::Universe;
use ::mpi::topology::SimpleCommunicator;
use ::mpi::traits::{Communicator as _, Root as _};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Owns the MPI environment; MPI is finalized when the session drops.
pub struct MpiSession {
    universe: Universe,
}

impl MpiSession {
    pub fn initialize() -> DielecResult<Self> {
        ::mpi::initialize()
            .map(|universe| Self { universe })
            .ok_or_else(|| {
                DielecError::internal(
                    "SYS.MPI_INIT",
                    "MPI was already initialized in this process",
                )
            })
    }

    pub fn world(&self) -> MpiComm {
        MpiComm {
            world: self.universe.world(),
        }
    }
}

pub struct MpiComm {
    world: SimpleCommunicator,
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    /// Length first, then the bytes, both from rank 0. A root that cannot
    /// encode its value sends `null` and reports its own error, so receivers
    /// never block on a second collective that will not come.
    fn broadcast<T: Serialize + DeserializeOwned>(&self, value: Option<T>) -> DielecResult<T> {
        let root = self.world.process_at_rank(ROOT_RANK as ::mpi::Rank);

        let mut local_failure = None;
        let mut bytes = if self.is_root() {
            encode_payload(value.as_ref()).unwrap_or_else(|error| {
                local_failure = Some(error);
                NULL_PAYLOAD.to_vec()
            })
        } else {
            Vec::new()
        };

        let mut len = bytes.len() as u64;
        root.broadcast_into(&mut len);
        bytes.resize(len as usize, 0);
        root.broadcast_into(&mut bytes[..]);

        if let Some(error) = local_failure {
            return Err(error);
        }
        decode_payload(&bytes)
    }
}
