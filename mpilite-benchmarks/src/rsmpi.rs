//! Communicator backed by a system MPI library through rsmpi.
//!
//! Elements travel as bytes, so counts and displacements are scaled by the
//! element size before they reach MPI.
use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::{
    Communicator as MpiCommunicator, CommunicatorCollectives, Destination, Equivalence, Root,
    Source,
};
use mpi::Count;
use mpilite::communicator::{Communicator, Status};
use mpilite::datatype::Datatype;
use std::mem::size_of;

pub struct RsmpiComm {
    world: SimpleCommunicator,
}

impl RsmpiComm {
    pub fn new(world: SimpleCommunicator) -> RsmpiComm {
        RsmpiComm { world }
    }

    /// Tear down every process of the job.
    ///
    /// Peers blocked in a collective are not released by a single rank
    /// returning, so fatal errors go through here.
    pub fn abort(&self, code: i32) -> ! {
        self.world.abort(code)
    }
}

fn byte_table<T>(elements: &[usize]) -> Vec<Count> {
    elements
        .iter()
        .map(|n| (n * size_of::<T>()) as Count)
        .collect()
}

impl Communicator for RsmpiComm {
    fn size(&self) -> i32 {
        self.world.size()
    }

    fn rank(&self) -> i32 {
        self.world.rank()
    }

    fn barrier(&self) -> mpilite::Result<()> {
        self.world.barrier();
        Ok(())
    }

    fn wtime(&self) -> f64 {
        mpi::time()
    }

    fn send<T: Datatype>(&self, data: &[T], dest: i32, tag: i32) -> mpilite::Result<()> {
        self.world
            .process_at_rank(dest)
            .send_with_tag(T::as_bytes(data), tag);
        Ok(())
    }

    fn recv<T: Datatype>(&self, data: &mut [T], source: i32, tag: i32) -> mpilite::Result<Status> {
        let status = self
            .world
            .process_at_rank(source)
            .receive_into_with_tag(T::as_bytes_mut(data), tag);
        let bytes = status.count(u8::equivalent_datatype()) as usize;
        Ok(Status {
            source: status.source_rank(),
            tag: status.tag(),
            count: bytes / size_of::<T>(),
        })
    }

    fn broadcast<T: Datatype>(&self, data: &mut [T], root: i32) -> mpilite::Result<()> {
        self.world
            .process_at_rank(root)
            .broadcast_into(T::as_bytes_mut(data));
        Ok(())
    }

    fn scatterv<T: Datatype>(
        &self,
        send: &[T],
        counts: &[usize],
        displs: &[usize],
        recv: &mut [T],
        root: i32,
    ) -> mpilite::Result<()> {
        let root_process = self.world.process_at_rank(root);
        let recv = T::as_bytes_mut(&mut recv[..counts[self.rank() as usize]]);
        if self.rank() == root {
            let partition = Partition::new(
                T::as_bytes(send),
                byte_table::<T>(counts),
                byte_table::<T>(displs),
            );
            root_process.scatter_varcount_into_root(&partition, recv);
        } else {
            root_process.scatter_varcount_into(recv);
        }
        Ok(())
    }

    fn gatherv<T: Datatype>(
        &self,
        send: &[T],
        recv: &mut [T],
        counts: &[usize],
        displs: &[usize],
        root: i32,
    ) -> mpilite::Result<()> {
        let root_process = self.world.process_at_rank(root);
        if self.rank() == root {
            let mut partition = PartitionMut::new(
                T::as_bytes_mut(recv),
                byte_table::<T>(counts),
                byte_table::<T>(displs),
            );
            root_process.gather_varcount_into_root(T::as_bytes(send), &mut partition);
        } else {
            root_process.gather_varcount_into(T::as_bytes(send));
        }
        Ok(())
    }
}
