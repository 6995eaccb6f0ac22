//! Processing units and their placement within layers.

use super::{ConnectionId, LayerId, Network, UnitId};
use crate::error::{check_position, Result, SomkitError};
use crate::function::{activation, FunctionInstance, FunctionKind};
use crate::vector::Vector;
use log::debug;

/// A processing unit.
///
/// `origin` lists the connections leaving this unit, `destination` the
/// connections arriving at it, each in creation order.
#[derive(Debug, Clone)]
pub struct Unit {
    pub(super) layer: Option<LayerId>,
    pub(super) index: usize,
    pub(super) activation: f64,
    pub(super) output: f64,
    pub(super) function: FunctionInstance,
    pub(super) origin: Vec<ConnectionId>,
    pub(super) destination: Vec<ConnectionId>,
    pub(super) coordinate: Option<Vector>,
    pub(super) average: f64,
    pub(super) std_dev: f64,
}

impl Unit {
    fn new(function: FunctionInstance) -> Self {
        Self {
            layer: None,
            index: 0,
            activation: 0.0,
            output: 0.0,
            function,
            origin: Vec::new(),
            destination: Vec::new(),
            coordinate: None,
            average: 0.0,
            std_dev: 0.0,
        }
    }

    /// Owning layer, if attached.
    #[inline]
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// 1-based position in the owning layer, or 0 when detached.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Net input computed by the last activation.
    #[inline]
    pub fn activation(&self) -> f64 {
        self.activation
    }

    /// Output computed by the last activation.
    #[inline]
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Activation function.
    #[inline]
    pub fn function(&self) -> &FunctionInstance {
        &self.function
    }

    /// Outgoing connections.
    #[inline]
    pub fn origin_connections(&self) -> &[ConnectionId] {
        &self.origin
    }

    /// Incoming connections.
    #[inline]
    pub fn destination_connections(&self) -> &[ConnectionId] {
        &self.destination
    }

    /// True if any connection touches this unit.
    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.origin.is_empty() || !self.destination.is_empty()
    }

    /// Spatial coordinate used by neighborhood functions.
    #[inline]
    pub fn coordinate(&self) -> Option<&Vector> {
        self.coordinate.as_ref()
    }

    /// Running average of the unit's output.
    #[inline]
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Running standard deviation of the unit's output.
    #[inline]
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl Network {
    /// Looks up a unit, attached or not.
    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units
            .get(&id)
            .ok_or_else(|| SomkitError::NotFound(id.to_string()))
    }

    pub(super) fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units
            .get_mut(&id)
            .ok_or_else(|| SomkitError::NotFound(id.to_string()))
    }

    /// Total number of units owned by the network, attached or detached.
    pub fn owned_unit_count(&self) -> usize {
        self.units.len()
    }

    /// The unit at 1-based `position` of `layer`.
    pub fn unit_at(&self, layer: LayerId, position: usize) -> Result<UnitId> {
        let units = &self.layer(layer)?.units;
        check_position(position, units.len())?;
        Ok(units[position - 1])
    }

    /// Creates a detached unit. Without an explicit function it gets the
    /// identity activation.
    pub fn create_unit(&mut self, function: Option<FunctionInstance>) -> Result<UnitId> {
        let function = match function {
            Some(f) if f.class().kind != FunctionKind::Activation => {
                return Err(SomkitError::InvalidArgument(format!(
                    "'{}' is not an activation function",
                    f.name()
                )))
            }
            Some(f) => f,
            None => activation::identity_class().instance(),
        };
        let id = UnitId(self.next_id());
        self.units.insert(id, Unit::new(function));
        Ok(id)
    }

    /// Creates a unit and appends it to `layer`. Without an explicit
    /// function it gets the layer class's default activation.
    pub fn add_unit(&mut self, layer: LayerId, function: Option<FunctionInstance>) -> Result<UnitId> {
        let function = match function {
            Some(f) => f,
            None => self.layer(layer)?.class.default_activation().instance(),
        };
        let id = self.create_unit(Some(function))?;
        self.attach_unit(id, layer, None)?;
        Ok(id)
    }

    /// Appends `count` default units to `layer`.
    pub fn add_units(&mut self, layer: LayerId, count: usize) -> Result<Vec<UnitId>> {
        (0..count).map(|_| self.add_unit(layer, None)).collect()
    }

    /// Inserts a unit into `layer` at `position` (append when `None`),
    /// detaching it from any previous layer first.
    pub fn attach_unit(&mut self, unit: UnitId, layer: LayerId, position: Option<usize>) -> Result<()> {
        let current = self.unit(unit)?.layer;
        let target_len = self.layer(layer)?.units.len();
        let count = target_len - usize::from(current == Some(layer));
        let position = position.unwrap_or(count + 1);
        check_position(position, count + 1)?;

        if current.is_some() {
            self.remove_unit(unit)?;
        }

        let attached = {
            let l = self.layer_mut(layer)?;
            l.units.insert(position - 1, unit);
            l.attached
        };
        if attached {
            self.unit_count += 1;
        }
        self.unit_mut(unit)?.layer = Some(layer);
        self.renumber_units(layer, position)?;

        debug!("Attached {} to {} at position {}", unit, layer, position);
        Ok(())
    }

    /// Removes a unit from its layer, leaving it detached. Its connections
    /// are kept.
    pub fn remove_unit(&mut self, unit: UnitId) -> Result<()> {
        let layer = self
            .unit(unit)?
            .layer
            .ok_or_else(|| SomkitError::Structure(format!("{} is not attached", unit)))?;

        let (position, attached) = {
            let l = self.layer_mut(layer)?;
            let position = l
                .units
                .iter()
                .position(|&u| u == unit)
                .ok_or_else(|| SomkitError::Structure(format!("{} missing from {}", unit, layer)))?;
            l.units.remove(position);
            (position, l.attached)
        };
        if attached {
            self.unit_count -= 1;
        }
        {
            let u = self.unit_mut(unit)?;
            u.layer = None;
            u.index = 0;
        }
        self.renumber_units(layer, position + 1)?;
        Ok(())
    }

    /// Destroys a unit. A connected unit is only destroyed when
    /// `cascade_connections` is set, in which case its connections go too.
    pub fn destroy_unit(&mut self, unit: UnitId, cascade_connections: bool) -> Result<()> {
        let u = self.unit(unit)?;
        if u.is_connected() {
            if !cascade_connections {
                return Err(SomkitError::Structure(format!("{} still has connections", unit)));
            }
            let touching: Vec<ConnectionId> = u.origin.iter().chain(u.destination.iter()).copied().collect();
            for conn in touching {
                // a self-connection appears in both lists
                if self.connections.contains_key(&conn) {
                    self.disconnect(conn)?;
                }
            }
        }
        if self.unit(unit)?.layer.is_some() {
            self.remove_unit(unit)?;
        }
        self.units.remove(&unit);
        Ok(())
    }

    /// Replaces a unit's activation function.
    pub fn set_unit_function(&mut self, unit: UnitId, function: FunctionInstance) -> Result<()> {
        if function.class().kind != FunctionKind::Activation {
            return Err(SomkitError::InvalidArgument(format!(
                "'{}' is not an activation function",
                function.name()
            )));
        }
        self.unit_mut(unit)?.function = function;
        Ok(())
    }

    /// Sets or clears a unit's spatial coordinate.
    pub fn set_unit_coordinate(&mut self, unit: UnitId, coordinate: Option<Vector>) -> Result<()> {
        self.unit_mut(unit)?.coordinate = coordinate;
        Ok(())
    }

    /// Sets a unit's running output statistics.
    pub fn set_unit_stats(&mut self, unit: UnitId, average: f64, std_dev: f64) -> Result<()> {
        let u = self.unit_mut(unit)?;
        u.average = average;
        u.std_dev = std_dev;
        Ok(())
    }

    /// Gives the units of `layer` row-major coordinates on a `rows x cols`
    /// grid: unit `k` (0-based) sits at `(k / cols, k % cols)`.
    pub fn assign_grid_coordinates(&mut self, layer: LayerId, rows: usize, cols: usize) -> Result<()> {
        let units = self.layer(layer)?.units.clone();
        if rows * cols != units.len() {
            return Err(SomkitError::DimensionMismatch {
                expected: units.len(),
                found: rows * cols,
            });
        }
        for (k, unit) in units.into_iter().enumerate() {
            let coordinate = Vector::from(vec![(k / cols) as f64, (k % cols) as f64]);
            self.unit_mut(unit)?.coordinate = Some(coordinate);
        }
        Ok(())
    }

    fn renumber_units(&mut self, layer: LayerId, from: usize) -> Result<()> {
        let units = self.layer(layer)?.units.clone();
        for (i, unit) in units.into_iter().enumerate().skip(from.saturating_sub(1)) {
            self.unit_mut(unit)?.index = i + 1;
        }
        Ok(())
    }
}
