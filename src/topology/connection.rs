//! Weighted connections between units.

use super::{ConnectionId, LayerId, Network, UnitId};
use crate::error::{Result, SomkitError};
use crate::function::{FunctionInstance, FunctionKind};
use crate::vector::Vector;
use log::debug;
use rand::Rng;

/// A directed, weighted connection. It is threaded onto the outgoing list
/// of its origin and the incoming list of its destination.
#[derive(Debug, Clone)]
pub struct Connection {
    pub(super) origin: UnitId,
    pub(super) destination: UnitId,
    pub(super) weight: f64,
    pub(super) init: Option<FunctionInstance>,
}

impl Connection {
    /// Source unit.
    #[inline]
    pub fn origin(&self) -> UnitId {
        self.origin
    }

    /// Target unit.
    #[inline]
    pub fn destination(&self) -> UnitId {
        self.destination
    }

    /// Current weight.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Initializer that produced the starting weight, if any.
    #[inline]
    pub fn init(&self) -> Option<&FunctionInstance> {
        self.init.as_ref()
    }
}

impl Network {
    /// Looks up a connection.
    pub fn connection(&self, id: ConnectionId) -> Result<&Connection> {
        self.connections
            .get(&id)
            .ok_or_else(|| SomkitError::NotFound(id.to_string()))
    }

    /// Number of connections.
    #[inline]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connects `origin` to `destination`. When `init` is given the weight
    /// is replaced by one sample of the initializer.
    pub fn connect<R: Rng + ?Sized>(
        &mut self,
        origin: UnitId,
        destination: UnitId,
        weight: f64,
        init: Option<FunctionInstance>,
        rng: &mut R,
    ) -> Result<ConnectionId> {
        self.unit(origin)?;
        self.unit(destination)?;

        let weight = match &init {
            Some(f) if f.class().kind != FunctionKind::WeightInit => {
                return Err(SomkitError::InvalidArgument(format!(
                    "'{}' is not a weight initializer",
                    f.name()
                )))
            }
            Some(f) => f.sample(rng),
            None => weight,
        };

        let id = ConnectionId(self.next_id());
        self.connections.insert(
            id,
            Connection {
                origin,
                destination,
                weight,
                init,
            },
        );
        self.unit_mut(origin)?.origin.push(id);
        self.unit_mut(destination)?.destination.push(id);
        Ok(id)
    }

    /// Unlinks a connection from both endpoints and destroys it.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<()> {
        let conn = self
            .connections
            .remove(&id)
            .ok_or_else(|| SomkitError::NotFound(id.to_string()))?;
        if let Some(u) = self.units.get_mut(&conn.origin) {
            u.origin.retain(|&c| c != id);
        }
        if let Some(u) = self.units.get_mut(&conn.destination) {
            u.destination.retain(|&c| c != id);
        }
        Ok(())
    }

    /// Connects every unit of `origin` to every unit of `destination`.
    /// Each destination's incoming list ends up in origin-unit order.
    pub fn connect_layers<R: Rng + ?Sized>(
        &mut self,
        origin: LayerId,
        destination: LayerId,
        weight: f64,
        init: Option<&FunctionInstance>,
        rng: &mut R,
    ) -> Result<usize> {
        let from = self.layer(origin)?.units.clone();
        let to = self.layer(destination)?.units.clone();

        for &o in &from {
            for &d in &to {
                self.connect(o, d, weight, init.cloned(), rng)?;
            }
        }

        let count = from.len() * to.len();
        debug!("Connected {} -> {} with {} connections", origin, destination, count);
        Ok(count)
    }

    /// Sets one connection's weight.
    pub fn set_weight(&mut self, id: ConnectionId, weight: f64) -> Result<()> {
        self.connections
            .get_mut(&id)
            .ok_or_else(|| SomkitError::NotFound(id.to_string()))?
            .weight = weight;
        Ok(())
    }

    /// Incoming weights of `unit`, in incoming-list order.
    pub fn unit_weights(&self, unit: UnitId) -> Result<Vector> {
        self.unit(unit)?
            .destination
            .iter()
            .map(|c| self.connection(*c).map(|c| c.weight))
            .collect::<Result<Vec<f64>>>()
            .map(Vector::from)
    }

    /// Overwrites the incoming weights of `unit`.
    pub fn set_unit_weights(&mut self, unit: UnitId, weights: &Vector) -> Result<()> {
        let incoming = self.unit(unit)?.destination.clone();
        if incoming.len() != weights.dim() {
            return Err(SomkitError::DimensionMismatch {
                expected: incoming.len(),
                found: weights.dim(),
            });
        }
        for (conn, w) in incoming.into_iter().zip(weights.iter()) {
            self.set_weight(conn, *w)?;
        }
        Ok(())
    }

    /// Sets every connection weight to `value`.
    pub fn reset_weights(&mut self, value: f64) {
        for conn in self.connections.values_mut() {
            conn.weight = value;
        }
    }
}
