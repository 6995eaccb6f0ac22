//! The network container and its layer sequence.

use super::{Connection, ConnectionId, Extension, Layer, LayerClass, LayerId, Placement, SomExtension, Unit, UnitId};
use crate::error::{check_position, Result, SomkitError};
use log::debug;
use std::collections::HashMap;

/// A neural network: an ordered sequence of layers plus the units and
/// connections they own.
#[derive(Debug, Clone)]
pub struct Network {
    pub(super) name: String,
    pub(super) extension: Option<Extension>,
    pub(super) order: Vec<LayerId>,
    pub(super) layers: HashMap<LayerId, Layer>,
    pub(super) units: HashMap<UnitId, Unit>,
    pub(super) connections: HashMap<ConnectionId, Connection>,
    pub(super) unit_count: usize,
    next_id: usize,
}

impl Network {
    /// Creates an empty network.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: None,
            order: Vec::new(),
            layers: HashMap::new(),
            units: HashMap::new(),
            connections: HashMap::new(),
            unit_count: 0,
            next_id: 1,
        }
    }

    pub(super) fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Network name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the network.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Attached specialization, if any.
    #[inline]
    pub fn extension(&self) -> Option<&Extension> {
        self.extension.as_ref()
    }

    /// Mutable access to the attached specialization.
    #[inline]
    pub fn extension_mut(&mut self) -> Option<&mut Extension> {
        self.extension.as_mut()
    }

    /// Replaces the specialization, returning the previous one.
    pub fn set_extension(&mut self, extension: Option<Extension>) -> Option<Extension> {
        std::mem::replace(&mut self.extension, extension)
    }

    /// The SOM extension, or an error if the network is not a SOM.
    pub fn som(&self) -> Result<&SomExtension> {
        match &self.extension {
            Some(Extension::Som(som)) => Ok(som),
            _ => Err(SomkitError::InvalidArgument(format!(
                "network '{}' has no SOM extension",
                self.name
            ))),
        }
    }

    /// Mutable SOM extension.
    pub fn som_mut(&mut self) -> Result<&mut SomExtension> {
        let name = &self.name;
        match &mut self.extension {
            Some(Extension::Som(som)) => Ok(som),
            _ => Err(SomkitError::InvalidArgument(format!(
                "network '{}' has no SOM extension",
                name
            ))),
        }
    }

    /// Number of attached layers.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.order.len()
    }

    /// Number of units in attached layers.
    #[inline]
    pub fn unit_count(&self) -> usize {
        self.unit_count
    }

    /// Attached layers in order.
    #[inline]
    pub fn layer_ids(&self) -> &[LayerId] {
        &self.order
    }

    /// Looks up a layer, attached or not.
    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.layers
            .get(&id)
            .ok_or_else(|| SomkitError::NotFound(id.to_string()))
    }

    pub(super) fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer> {
        self.layers
            .get_mut(&id)
            .ok_or_else(|| SomkitError::NotFound(id.to_string()))
    }

    /// The attached layer at 1-based `position`.
    pub fn layer_at(&self, position: usize) -> Result<LayerId> {
        check_position(position, self.order.len())?;
        Ok(self.order[position - 1])
    }

    /// First attached layer.
    pub fn input_layer(&self) -> Result<LayerId> {
        self.order
            .first()
            .copied()
            .ok_or_else(|| SomkitError::Structure(format!("network '{}' has no layers", self.name)))
    }

    /// Last attached layer.
    pub fn output_layer(&self) -> Result<LayerId> {
        self.order
            .last()
            .copied()
            .ok_or_else(|| SomkitError::Structure(format!("network '{}' has no layers", self.name)))
    }

    /// Creates a layer and, unless `placement` is [`Placement::Detached`],
    /// attaches it to the layer sequence.
    pub fn create_layer(
        &mut self,
        class: LayerClass,
        name: impl Into<String>,
        placement: Placement,
    ) -> Result<LayerId> {
        if let Placement::At(p) = placement {
            check_position(p, self.order.len() + 1)?;
        }

        let id = LayerId(self.next_id());
        self.layers.insert(id, Layer::new(class, name.into()));
        if let Some(position) = placement.position() {
            self.attach_layer(id, position)?;
        }
        Ok(id)
    }

    /// Inserts a layer at `position` (append when `None`), detaching it first
    /// if it is already attached. Valid positions are `1..=layer_count + 1`
    /// counted without the layer itself.
    pub fn attach_layer(&mut self, id: LayerId, position: Option<usize>) -> Result<()> {
        let attached = self.layer(id)?.attached;
        let count = self.order.len() - usize::from(attached);
        let position = position.unwrap_or(count + 1);
        check_position(position, count + 1)?;

        if attached {
            self.remove_layer(id)?;
        }

        self.order.insert(position - 1, id);
        let units = {
            let layer = self.layer_mut(id)?;
            layer.attached = true;
            layer.units.len()
        };
        self.unit_count += units;
        self.renumber_layers(position);

        debug!("Attached {} at position {} of '{}'", id, position, self.name);
        Ok(())
    }

    /// Removes a layer from the sequence, leaving it detached.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<()> {
        if !self.layer(id)?.attached {
            return Err(SomkitError::Structure(format!("{} is not attached", id)));
        }
        let position = self
            .order
            .iter()
            .position(|&l| l == id)
            .ok_or_else(|| SomkitError::Structure(format!("{} missing from layer sequence", id)))?;

        self.order.remove(position);
        let units = {
            let layer = self.layer_mut(id)?;
            layer.attached = false;
            layer.index = 0;
            layer.units.len()
        };
        self.unit_count -= units;
        self.renumber_layers(position + 1);

        debug!("Removed {} from '{}'", id, self.name);
        Ok(())
    }

    /// Destroys a layer.
    ///
    /// A layer with units is only destroyed when `cascade_units` is set; its
    /// units are then destroyed too, which in turn requires
    /// `cascade_connections` if any of them is connected. Nothing is changed
    /// when the call fails.
    pub fn destroy_layer(
        &mut self,
        id: LayerId,
        cascade_units: bool,
        cascade_connections: bool,
    ) -> Result<()> {
        let layer = self.layer(id)?;
        if !layer.units.is_empty() {
            if !cascade_units {
                return Err(SomkitError::Structure(format!("{} still has units", id)));
            }
            if !cascade_connections {
                for unit in &layer.units {
                    if self.unit(*unit)?.is_connected() {
                        return Err(SomkitError::Structure(format!("{} still has connections", unit)));
                    }
                }
            }
        }

        if layer.attached {
            self.remove_layer(id)?;
        }
        let units = self.layer(id)?.units.clone();
        for unit in units {
            self.destroy_unit(unit, cascade_connections)?;
        }
        self.layers.remove(&id);

        debug!("Destroyed {}", id);
        Ok(())
    }

    fn renumber_layers(&mut self, from: usize) {
        for position in from.max(1)..=self.order.len() {
            let id = self.order[position - 1];
            if let Some(layer) = self.layers.get_mut(&id) {
                layer.index = position;
            }
        }
    }

    /// Verifies cached positions and counters against the actual containers.
    pub fn check_invariants(&self) -> Result<()> {
        let mut units = 0;
        for (position, id) in self.order.iter().enumerate() {
            let layer = self.layer(*id)?;
            if !layer.attached || layer.index != position + 1 {
                return Err(SomkitError::Structure(format!(
                    "{} cached index {} at position {}",
                    id,
                    layer.index,
                    position + 1
                )));
            }
            units += layer.units.len();
        }
        if units != self.unit_count {
            return Err(SomkitError::Structure(format!(
                "unit counter {} but layers hold {}",
                self.unit_count, units
            )));
        }

        for (lid, layer) in &self.layers {
            for (position, uid) in layer.units.iter().enumerate() {
                let unit = self.unit(*uid)?;
                if unit.layer != Some(*lid) || unit.index != position + 1 {
                    return Err(SomkitError::Structure(format!(
                        "{} cached index {} at position {} of {}",
                        uid,
                        unit.index,
                        position + 1,
                        lid
                    )));
                }
            }
        }

        for (cid, conn) in &self.connections {
            let origin = self.unit(conn.origin)?;
            let destination = self.unit(conn.destination)?;
            if !origin.origin.contains(cid) || !destination.destination.contains(cid) {
                return Err(SomkitError::Structure(format!("{} is not threaded on both endpoints", cid)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_layers() -> (Network, Vec<LayerId>) {
        let mut net = Network::new("test");
        let ids = ["a", "b", "c"]
            .iter()
            .map(|n| net.create_layer(LayerClass::Hidden, *n, Placement::Append).unwrap())
            .collect();
        (net, ids)
    }

    #[test]
    fn test_append_numbering() {
        let (net, ids) = three_layers();
        assert_eq!(net.layer_count(), 3);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(net.layer(*id).unwrap().index(), i + 1);
        }
        net.check_invariants().unwrap();
    }

    #[test]
    fn test_attach_at_front_renumbers() {
        let (mut net, ids) = three_layers();
        let front = net.create_layer(LayerClass::Input, "front", Placement::At(1)).unwrap();
        assert_eq!(net.layer_count(), 4);
        assert_eq!(net.layer(front).unwrap().index(), 1);
        assert_eq!(net.layer(ids[0]).unwrap().index(), 2);
        assert_eq!(net.layer(ids[1]).unwrap().index(), 3);
        assert_eq!(net.layer(ids[2]).unwrap().index(), 4);
        net.check_invariants().unwrap();
    }

    #[test]
    fn test_attach_position_validation() {
        let (mut net, _) = three_layers();
        assert!(net.create_layer(LayerClass::Hidden, "x", Placement::At(0)).is_err());
        assert!(net.create_layer(LayerClass::Hidden, "x", Placement::At(5)).is_err());
        let id = net.create_layer(LayerClass::Hidden, "x", Placement::At(4)).unwrap();
        assert_eq!(net.layer(id).unwrap().index(), 4);
    }

    #[test]
    fn test_remove_middle_preserves_order() {
        let (mut net, ids) = three_layers();
        net.remove_layer(ids[1]).unwrap();
        assert_eq!(net.layer_ids(), &[ids[0], ids[2]]);
        assert_eq!(net.layer(ids[2]).unwrap().index(), 2);
        assert!(!net.layer(ids[1]).unwrap().is_attached());
        assert_eq!(net.layer(ids[1]).unwrap().index(), 0);
        assert!(net.remove_layer(ids[1]).is_err());
        net.check_invariants().unwrap();
    }

    #[test]
    fn test_reattach_moves_layer() {
        let (mut net, ids) = three_layers();
        net.attach_layer(ids[2], Some(1)).unwrap();
        assert_eq!(net.layer_ids(), &[ids[2], ids[0], ids[1]]);
        // position is counted without the layer itself
        assert!(net.attach_layer(ids[0], Some(4)).is_err());
        net.attach_layer(ids[0], Some(3)).unwrap();
        assert_eq!(net.layer_ids(), &[ids[2], ids[1], ids[0]]);
        net.check_invariants().unwrap();
    }

    #[test]
    fn test_detached_layer_creation() {
        let mut net = Network::new("n");
        let id = net.create_layer(LayerClass::Output, "loose", Placement::Detached).unwrap();
        assert_eq!(net.layer_count(), 0);
        assert!(!net.layer(id).unwrap().is_attached());
        assert!(net.input_layer().is_err());
        net.attach_layer(id, None).unwrap();
        assert_eq!(net.output_layer().unwrap(), id);
    }

    #[test]
    fn test_destroy_layer_requires_cascade() {
        let mut net = Network::new("n");
        let l = net.create_layer(LayerClass::Input, "in", Placement::Append).unwrap();
        net.add_units(l, 3).unwrap();
        assert_eq!(net.unit_count(), 3);
        assert!(matches!(net.destroy_layer(l, false, false), Err(SomkitError::Structure(_))));
        assert_eq!(net.layer_count(), 1);
        net.destroy_layer(l, true, false).unwrap();
        assert_eq!(net.layer_count(), 0);
        assert_eq!(net.unit_count(), 0);
        assert!(net.layer(l).is_err());
        net.check_invariants().unwrap();
    }
}
